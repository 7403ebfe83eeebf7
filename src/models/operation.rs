use serde::{Deserialize, Serialize};

/// A catalog entry: a single named unit of work on a service or service+component.
///
/// `name` conventionally follows `<service>[_<component>]_<action>`. Parsing
/// that convention is a heuristic (there is no delimiter beyond `_`), so the
/// collections loader may override `component` explicitly when the heuristic
/// would be ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub service: String,
    pub component: Option<String>,
    pub action: String,
    pub noop: bool,
    pub host_names: Vec<String>,
}

impl Operation {
    pub fn new(name: &str, noop: bool, host_names: Vec<String>, component_override: Option<String>) -> Self {
        let (service, component, action) = parse_name(name, component_override);
        Self {
            name: name.to_string(),
            service,
            component,
            action,
            noop,
            host_names,
        }
    }

    /// (service, component) pair this operation's config/start/restart targets.
    pub fn scope(&self) -> (String, Option<String>) {
        (self.service.clone(), self.component.clone())
    }
}

fn parse_name(name: &str, component_override: Option<String>) -> (String, Option<String>, String) {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 2 {
        return (name.to_string(), component_override, String::new());
    }
    let action = parts[parts.len() - 1].to_string();
    let rest = &parts[..parts.len() - 1];
    if let Some(component) = component_override {
        let rest_str = rest.join("_");
        let service = rest_str
            .strip_suffix(&format!("_{component}"))
            .map(|s| s.to_string())
            .unwrap_or(rest_str);
        return (service, Some(component), action);
    }
    if rest.len() == 1 {
        (rest[0].to_string(), None, action)
    } else {
        let component = rest[rest.len() - 1].to_string();
        let service = rest[..rest.len() - 1].join("_");
        (service, Some(component), action)
    }
}

/// Candidate `*_restart` name for a `*_start` operation name, if this is a
/// start operation at all.
pub fn restart_candidate(name: &str) -> Option<String> {
    name.strip_suffix("_start").map(|prefix| format!("{prefix}_restart"))
}
