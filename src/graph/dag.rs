use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use glob::Pattern;
use regex::Regex;

use crate::collections::Collections;
use crate::error::DeployError;
use crate::models::{FilterTypeEnum, Operation};

/// The operation graph: nodes are operation names, edges are "must precede"
/// relations declared by the collections. Immutable once built.
pub struct Dag {
    operations: HashMap<String, Operation>,
    order_key: HashMap<String, usize>,
    /// depends_on -> [things that require it], i.e. the "precedes" direction.
    precedes: HashMap<String, Vec<String>>,
    /// this -> [things it requires].
    requires: HashMap<String, Vec<String>>,
}

impl Dag {
    /// Builds the graph from a loaded catalog. Fails with `InvalidDag` on a
    /// cycle or an edge endpoint absent from the catalog.
    pub fn new(collections: &Collections) -> Result<Dag, DeployError> {
        let operations = collections.operations().clone();

        let mut requires: HashMap<String, Vec<String>> = HashMap::new();
        let mut precedes: HashMap<String, Vec<String>> = HashMap::new();
        for name in operations.keys() {
            requires.entry(name.clone()).or_default();
            precedes.entry(name.clone()).or_default();
        }
        for (this, dep) in collections.edges() {
            if !operations.contains_key(this) || !operations.contains_key(dep) {
                return Err(DeployError::invalid_dag(format!(
                    "edge ({this}, {dep}) references an operation not in the catalog"
                )));
            }
            requires.entry(this.clone()).or_default().push(dep.clone());
            precedes.entry(dep.clone()).or_default().push(this.clone());
        }

        let order_key = kahn_order(&operations, &requires)?;

        Ok(Dag {
            operations,
            order_key,
            precedes,
            requires,
        })
    }

    pub fn operations(&self) -> HashSet<String> {
        self.operations.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Index in the deterministic topological order. Ties break
    /// lexicographically by name so the same catalog always yields the same
    /// ordering across runs.
    pub fn topological_sort_key(&self, name: &str) -> usize {
        self.order_key[name]
    }

    pub fn get_operations(
        &self,
        sources: Option<&[String]>,
        targets: Option<&[String]>,
        filter_expression: Option<&str>,
        filter_type: Option<FilterTypeEnum>,
        restart: bool,
    ) -> Result<Vec<Operation>, DeployError> {
        self.validate_names(sources)?;
        self.validate_names(targets)?;

        let mut selected: HashSet<String> = match (sources, targets) {
            (None, None) => self.operations.keys().cloned().collect(),
            (Some(s), None) if s.is_empty() => self.operations.keys().cloned().collect(),
            (None, Some(t)) if t.is_empty() => self.operations.keys().cloned().collect(),
            (Some(s), None) => self.forward_reachable(s),
            (None, Some(t)) => self.backward_reachable(t),
            (Some(s), Some(t)) => {
                if s.is_empty() && t.is_empty() {
                    self.operations.keys().cloned().collect()
                } else if s.is_empty() {
                    self.backward_reachable(t)
                } else if t.is_empty() {
                    self.forward_reachable(s)
                } else {
                    let from_sources = self.forward_reachable(s);
                    let to_targets = self.backward_reachable(t);
                    from_sources.intersection(&to_targets).cloned().collect()
                }
            }
        };

        if let Some(expr) = filter_expression {
            let matcher = build_matcher(expr, filter_type)?;
            selected.retain(|name| matcher(name));
        }

        let mut names: Vec<String> = selected.into_iter().collect();
        names.sort_by_key(|n| self.order_key[n]);

        let mut result = Vec::with_capacity(names.len());
        for name in names {
            let resolved_name = if restart {
                match crate::models::operation::restart_candidate(&name) {
                    Some(candidate) if self.operations.contains_key(&candidate) => candidate,
                    _ => name,
                }
            } else {
                name
            };
            result.push(self.operations[&resolved_name].clone());
        }
        Ok(result)
    }

    fn validate_names(&self, names: Option<&[String]>) -> Result<(), DeployError> {
        if let Some(names) = names {
            let unknown: Vec<String> = names
                .iter()
                .filter(|n| !self.operations.contains_key(*n))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(DeployError::unknown_node(&unknown));
            }
        }
        Ok(())
    }

    /// Nodes reachable from (or equal to) any of `starts`, following the
    /// "precedes" direction (things that require a start, transitively).
    fn forward_reachable(&self, starts: &[String]) -> HashSet<String> {
        self.bfs(starts, &self.precedes)
    }

    /// Nodes that can reach (or equal) any of `ends`, following the
    /// "requires" direction (prerequisites of an end, transitively).
    fn backward_reachable(&self, ends: &[String]) -> HashSet<String> {
        self.bfs(ends, &self.requires)
    }

    fn bfs(&self, starts: &[String], adjacency: &HashMap<String, Vec<String>>) -> HashSet<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for s in starts {
            if seen.insert(s.clone()) {
                queue.push_back(s.clone());
            }
        }
        while let Some(node) = queue.pop_front() {
            if let Some(neighbors) = adjacency.get(&node) {
                for n in neighbors {
                    if seen.insert(n.clone()) {
                        queue.push_back(n.clone());
                    }
                }
            }
        }
        seen
    }
}

/// Kahn's algorithm over the "requires" adjacency, breaking ties
/// lexicographically at every step.
fn kahn_order(
    operations: &HashMap<String, Operation>,
    requires: &HashMap<String, Vec<String>>,
) -> Result<HashMap<String, usize>, DeployError> {
    let mut in_degree: HashMap<String, usize> = HashMap::new();
    for name in operations.keys() {
        in_degree.insert(name.clone(), requires.get(name).map(|v| v.len()).unwrap_or(0));
    }

    // precedes[dep] = things that require dep, used to decrement in-degree.
    let mut precedes: HashMap<String, Vec<String>> = HashMap::new();
    for (name, deps) in requires {
        for dep in deps {
            precedes.entry(dep.clone()).or_default().push(name.clone());
        }
    }

    let mut ready: BTreeSet<String> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(n, _)| n.clone())
        .collect();

    let mut order = HashMap::new();
    let mut index = 0usize;
    while let Some(node) = ready.iter().next().cloned() {
        ready.remove(&node);
        order.insert(node.clone(), index);
        index += 1;
        if let Some(dependents) = precedes.get(&node) {
            for dependent in dependents {
                let deg = in_degree.get_mut(dependent).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(dependent.clone());
                }
            }
        }
    }

    if index != operations.len() {
        return Err(DeployError::invalid_dag("cycle detected in operation catalog"));
    }
    Ok(order)
}

fn build_matcher(
    expr: &str,
    filter_type: Option<FilterTypeEnum>,
) -> Result<Box<dyn Fn(&str) -> bool>, DeployError> {
    match filter_type.unwrap_or(FilterTypeEnum::Glob) {
        FilterTypeEnum::Glob => {
            let pattern = Pattern::new(expr).map_err(|e| DeployError::invalid_filter(expr, e))?;
            Ok(Box::new(move |name: &str| pattern.matches(name)))
        }
        FilterTypeEnum::Regex => {
            let re = Regex::new(expr).map_err(|e| DeployError::invalid_filter(expr, e))?;
            Ok(Box::new(move |name: &str| re.is_match(name) && re.find(name).map(|m| m.as_str().len() == name.len()).unwrap_or(false)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn sample() -> Collections {
        let mut ops: Map<String, Operation> = Map::new();
        let mut edges = Vec::new();
        let names = [
            "mock_install",
            "mock_config",
            "mock_start",
            "mock_restart",
            "mock_init",
            "mock_node_config",
            "mock_node_start",
            "mock_node_restart",
        ];
        for n in names {
            let noop = n == "mock_init";
            let component = if n.contains("_node_") { Some("node".to_string()) } else { None };
            ops.insert(n.to_string(), Operation::new(n, noop, vec![], component));
        }
        edges.push(("mock_config".to_string(), "mock_install".to_string()));
        edges.push(("mock_start".to_string(), "mock_config".to_string()));
        edges.push(("mock_restart".to_string(), "mock_config".to_string()));
        edges.push(("mock_init".to_string(), "mock_start".to_string()));
        edges.push(("mock_node_config".to_string(), "mock_install".to_string()));
        edges.push(("mock_node_start".to_string(), "mock_node_config".to_string()));
        edges.push(("mock_node_restart".to_string(), "mock_node_config".to_string()));

        Collections::from_parts(ops, edges)
    }

    #[test]
    fn full_dag_is_topologically_valid() {
        let collections = sample();
        let dag = Dag::new(&collections).unwrap();
        let ops = dag.get_operations(None, None, None, None, false).unwrap();
        assert_eq!(ops.len(), 8);
        let install_pos = ops.iter().position(|o| o.name == "mock_install").unwrap();
        let config_pos = ops.iter().position(|o| o.name == "mock_config").unwrap();
        assert!(install_pos < config_pos);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let collections = sample();
        let dag = Dag::new(&collections).unwrap();
        let err = dag
            .get_operations(Some(&["nope".to_string()]), None, None, None, false)
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::UnknownNode);
    }

    #[test]
    fn restart_substitutes_existing_restart_operations() {
        let collections = sample();
        let dag = Dag::new(&collections).unwrap();
        let ops = dag
            .get_operations(None, Some(&["mock_start".to_string()]), None, None, true)
            .unwrap();
        assert!(ops.iter().any(|o| o.name == "mock_restart"));
        assert!(!ops.iter().any(|o| o.name == "mock_start"));
    }

    #[test]
    fn glob_filter_narrows_selection() {
        let collections = sample();
        let dag = Dag::new(&collections).unwrap();
        let ops = dag
            .get_operations(
                None,
                Some(&["mock_init".to_string()]),
                Some("*_install"),
                Some(FilterTypeEnum::Glob),
                false,
            )
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "mock_install");
    }
}
