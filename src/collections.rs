use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::DeployError;
use crate::models::Operation;

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    component: Option<String>,
    #[serde(default)]
    noop: bool,
    #[serde(default)]
    host_names: Vec<String>,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    operations: HashMap<String, RawEntry>,
}

/// The catalog of known operations and the "must precede" edges between
/// them. An edge `(this, depends_on)` reads "this requires depends_on".
#[derive(Debug, Clone)]
pub struct Collections {
    operations: HashMap<String, Operation>,
    edges: Vec<(String, String)>,
}

impl Collections {
    /// Loads a collections YAML file of the shape documented in
    /// `tdp init`'s scaffolded `.tdp/collections.yaml`.
    pub fn load(path: &Path) -> Result<Collections, DeployError> {
        let raw = fs::read_to_string(path)?;
        let parsed: RawFile = serde_yaml::from_str(&raw)?;

        let mut operations = HashMap::new();
        let mut edges = Vec::new();
        for (name, entry) in parsed.operations {
            for dep in &entry.depends_on {
                edges.push((name.clone(), dep.clone()));
            }
            let op = Operation::new(&name, entry.noop, entry.host_names, entry.component);
            operations.insert(name, op);
        }

        Ok(Collections { operations, edges })
    }

    pub fn operations(&self) -> &HashMap<String, Operation> {
        &self.operations
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Builds a `Collections` directly from an operations map and edge list,
    /// bypassing the YAML loader. Used by tests that construct a catalog
    /// in-memory.
    pub fn from_parts(operations: HashMap<String, Operation>, edges: Vec<(String, String)>) -> Collections {
        Collections { operations, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("collections.yaml");
        let mut f = fs::File::create(&path).unwrap();
        write!(
            f,
            "operations:\n  mock_install: {{ host_names: [node1] }}\n  mock_config: {{ depends_on: [mock_install] }}\n  mock_start: {{ depends_on: [mock_config] }}\n"
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_operations_and_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir);
        let collections = Collections::load(&path).unwrap();
        assert_eq!(collections.operations().len(), 3);
        assert!(collections.edges().contains(&("mock_config".to_string(), "mock_install".to_string())));
    }
}
