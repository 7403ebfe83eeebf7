use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::DeployError;

/// Read-only access to the content-addressable hash of a (service,
/// component) scope's rendered variables.
pub trait ClusterVariables {
    fn get_hash(&self, service: &str, component: Option<&str>) -> Option<String>;
}

/// Loads a YAML file mapping `service` and `service.component` keys to
/// arbitrary variable trees, and hashes the canonicalized (sorted-key JSON)
/// rendering of each scope with sha2-256.
pub struct YamlClusterVariables {
    hashes: HashMap<(String, Option<String>), String>,
}

impl YamlClusterVariables {
    pub fn load(path: &Path) -> Result<YamlClusterVariables, DeployError> {
        let raw = fs::read_to_string(path)?;
        let parsed: HashMap<String, HashMap<String, Value>> = serde_yaml::from_str(&raw)?;

        let mut hashes = HashMap::new();
        for (service, components) in parsed {
            for (key, value) in components {
                let (component, canonical) = if key == "_service" {
                    (None, value)
                } else {
                    (Some(key), value)
                };
                let hash = hash_value(&canonical);
                hashes.insert((service.clone(), component), hash);
            }
        }
        Ok(YamlClusterVariables { hashes })
    }
}

impl ClusterVariables for YamlClusterVariables {
    fn get_hash(&self, service: &str, component: Option<&str>) -> Option<String> {
        self.hashes
            .get(&(service.to_string(), component.map(|s| s.to_string())))
            .cloned()
    }
}

fn hash_value(value: &Value) -> String {
    let canonical = canonicalize(value);
    let rendered = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Recursively sorts object keys so the hash is stable regardless of the
/// order keys appeared in the source YAML.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(String, Value)> = map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
