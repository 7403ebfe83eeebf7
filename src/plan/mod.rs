use crate::collections::Collections;
use crate::error::DeployError;
use crate::graph::dag::Dag;
use crate::models::{ComponentVersionLog, DeploymentLog, DeploymentTypeEnum, FilterTypeEnum};
use crate::variables::ClusterVariables;

/// Thin constructors that turn a DAG selection, an explicit operation list,
/// a failed deployment, or a reconfiguration intent into a `DeploymentLog`
/// in state PLANNED. None of these touch the database; persisting the
/// result (and enforcing the "one PLANNED deployment" invariant) is the
/// caller's job.
pub struct DeploymentPlan;

impl DeploymentPlan {
    pub fn from_dag(
        dag: &Dag,
        sources: Option<&[String]>,
        targets: Option<&[String]>,
        filter_expression: Option<&str>,
        filter_type: Option<FilterTypeEnum>,
        restart: bool,
    ) -> Result<DeploymentLog, DeployError> {
        let operations = dag.get_operations(sources, targets, filter_expression, filter_type, restart)?;
        if operations.is_empty() {
            return Err(DeployError::empty_deployment());
        }
        let names: Vec<String> = operations.into_iter().map(|op| op.name).collect();
        let mut log = DeploymentLog::planned(DeploymentTypeEnum::Dag, &names);
        log.sources = sources.map(|s| s.to_vec());
        log.targets = targets.map(|t| t.to_vec());
        log.filter_expression = filter_expression.map(|s| s.to_string());
        log.filter_type = filter_type;
        log.restart = restart;
        Ok(log)
    }

    /// Does not reorder: the caller-supplied sequence is executed verbatim.
    pub fn from_operations(collections: &Collections, names: &[String]) -> Result<DeploymentLog, DeployError> {
        if names.is_empty() {
            return Err(DeployError::empty_deployment());
        }
        let unknown: Vec<String> = names.iter().filter(|n| collections.get(n).is_none()).cloned().collect();
        if !unknown.is_empty() {
            return Err(DeployError::unknown_node(&unknown));
        }
        Ok(DeploymentLog::planned(DeploymentTypeEnum::Operations, names))
    }

    /// The new plan contains the failed operation and every subsequent
    /// operation from the failed plan, in the same order.
    pub fn from_failed_deployment(_collections: &Collections, failed_log: &DeploymentLog) -> Result<DeploymentLog, DeployError> {
        let failure_index = failed_log
            .first_failure_index()
            .ok_or_else(|| DeployError::validation("deployment has no failed operation to resume from"))?;

        let names: Vec<String> = failed_log.operations[failure_index..]
            .iter()
            .map(|op| op.operation.clone())
            .collect();
        if names.is_empty() {
            return Err(DeployError::empty_deployment());
        }
        Ok(DeploymentLog::planned(DeploymentTypeEnum::Resume, &names))
    }

    /// For every component whose currently-deployed version differs from
    /// the latest variables hash, include its `*_config` and `*_start`
    /// (or `*_restart`, if `restart` applies) operations. Present in the
    /// model per the original contract but not wired into the CLI.
    pub fn from_reconfigure(
        dag: &Dag,
        cluster_variables: &dyn ClusterVariables,
        component_versions_deployed: &[ComponentVersionLog],
        restart: bool,
    ) -> Result<DeploymentLog, DeployError> {
        let mut names = Vec::new();
        for deployed in component_versions_deployed {
            let current_hash = cluster_variables.get_hash(&deployed.service, deployed.component.as_deref());
            if current_hash.as_deref() == Some(deployed.version.as_str()) {
                continue;
            }

            let config_name = scoped_name(&deployed.service, deployed.component.as_deref(), "config");
            let start_name = scoped_name(&deployed.service, deployed.component.as_deref(), "start");
            let restart_name = scoped_name(&deployed.service, deployed.component.as_deref(), "restart");

            if dag.get(&config_name).is_some() {
                names.push(config_name);
            }
            if restart && dag.get(&restart_name).is_some() {
                names.push(restart_name);
            } else if dag.get(&start_name).is_some() {
                names.push(start_name);
            }
        }

        if names.is_empty() {
            return Err(DeployError::empty_deployment());
        }
        Ok(DeploymentLog::planned(DeploymentTypeEnum::Reconfigure, &names))
    }
}

fn scoped_name(service: &str, component: Option<&str>, action: &str) -> String {
    match component {
        Some(c) => format!("{service}_{c}_{action}"),
        None => format!("{service}_{action}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::dag::Dag;
    use crate::models::{DeploymentStateEnum, Operation};
    use std::collections::HashMap;

    fn sample_collections() -> Collections {
        let mut ops = HashMap::new();
        ops.insert("mock_install".to_string(), Operation::new("mock_install", false, vec![], None));
        ops.insert("mock_config".to_string(), Operation::new("mock_config", false, vec![], None));
        Collections::from_parts(ops, vec![("mock_config".to_string(), "mock_install".to_string())])
    }

    /// A catalog with both a service-level and a component-level
    /// config/start/restart triple, for exercising `from_reconfigure`.
    fn reconfigure_collections() -> Collections {
        let mut ops = HashMap::new();
        for n in ["mock_install", "mock_config", "mock_start", "mock_restart"] {
            ops.insert(n.to_string(), Operation::new(n, false, vec![], None));
        }
        for n in ["mock_node_config", "mock_node_start", "mock_node_restart"] {
            ops.insert(n.to_string(), Operation::new(n, false, vec![], Some("node".to_string())));
        }
        Collections::from_parts(
            ops,
            vec![
                ("mock_config".to_string(), "mock_install".to_string()),
                ("mock_start".to_string(), "mock_config".to_string()),
                ("mock_restart".to_string(), "mock_config".to_string()),
                ("mock_node_config".to_string(), "mock_install".to_string()),
                ("mock_node_start".to_string(), "mock_node_config".to_string()),
                ("mock_node_restart".to_string(), "mock_node_config".to_string()),
            ],
        )
    }

    /// Returns a fixed hash per scope, independent of what's recorded as
    /// "deployed" — lets a test decide per-scope staleness by choosing
    /// what it records as already deployed.
    struct FixedVariables(HashMap<(String, Option<String>), String>);

    impl crate::variables::ClusterVariables for FixedVariables {
        fn get_hash(&self, service: &str, component: Option<&str>) -> Option<String> {
            self.0.get(&(service.to_string(), component.map(str::to_string))).cloned()
        }
    }

    #[test]
    fn from_reconfigure_includes_only_stale_components() {
        let collections = reconfigure_collections();
        let dag = Dag::new(&collections).unwrap();

        let mut current = HashMap::new();
        current.insert(("mock".to_string(), None), "new-hash".to_string());
        current.insert(("mock".to_string(), Some("node".to_string())), "same-hash".to_string());
        let vars = FixedVariables(current);

        let deployed = vec![
            ComponentVersionLog {
                deployment_id: Some(1),
                emission_index: 0,
                service: "mock".to_string(),
                component: None,
                version: "old-hash".to_string(),
            },
            ComponentVersionLog {
                deployment_id: Some(1),
                emission_index: 1,
                service: "mock".to_string(),
                component: Some("node".to_string()),
                version: "same-hash".to_string(),
            },
        ];

        let log = DeploymentPlan::from_reconfigure(&dag, &vars, &deployed, false).unwrap();
        let names: Vec<&str> = log.operations.iter().map(|o| o.operation.as_str()).collect();

        // Only the service-level scope changed; the component-level scope's
        // hash still matches and is not re-planned.
        assert_eq!(names, vec!["mock_config", "mock_start"]);
        assert_eq!(log.deployment_type, DeploymentTypeEnum::Reconfigure);
    }

    #[test]
    fn from_reconfigure_restart_mode_substitutes_restart_for_start() {
        let collections = reconfigure_collections();
        let dag = Dag::new(&collections).unwrap();

        let mut current = HashMap::new();
        current.insert(("mock".to_string(), Some("node".to_string())), "new-hash".to_string());
        let vars = FixedVariables(current);

        let deployed = vec![ComponentVersionLog {
            deployment_id: Some(1),
            emission_index: 0,
            service: "mock".to_string(),
            component: Some("node".to_string()),
            version: "old-hash".to_string(),
        }];

        let log = DeploymentPlan::from_reconfigure(&dag, &vars, &deployed, true).unwrap();
        let names: Vec<&str> = log.operations.iter().map(|o| o.operation.as_str()).collect();
        assert_eq!(names, vec!["mock_node_config", "mock_node_restart"]);
    }

    #[test]
    fn from_reconfigure_with_nothing_deployed_is_empty_deployment() {
        let collections = reconfigure_collections();
        let dag = Dag::new(&collections).unwrap();
        let vars = FixedVariables(HashMap::new());

        let err = DeploymentPlan::from_reconfigure(&dag, &vars, &[], false).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::EmptyDeployment);
    }

    #[test]
    fn from_operations_preserves_order() {
        let collections = sample_collections();
        let names = vec!["mock_config".to_string(), "mock_install".to_string()];
        let log = DeploymentPlan::from_operations(&collections, &names).unwrap();
        let got: Vec<&str> = log.operations.iter().map(|o| o.operation.as_str()).collect();
        assert_eq!(got, vec!["mock_config", "mock_install"]);
        assert_eq!(log.state, DeploymentStateEnum::Planned);
    }

    #[test]
    fn from_operations_rejects_unknown_names() {
        let collections = sample_collections();
        let names = vec!["nope".to_string()];
        let err = DeploymentPlan::from_operations(&collections, &names).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::UnknownNode);
    }

    #[test]
    fn from_operations_rejects_empty_selection() {
        let collections = sample_collections();
        let err = DeploymentPlan::from_operations(&collections, &[]).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::EmptyDeployment);
    }

    #[test]
    fn from_failed_deployment_resumes_at_failure_point() {
        let collections = sample_collections();
        let names = vec!["mock_install".to_string(), "mock_config".to_string()];
        let mut failed = DeploymentPlan::from_operations(&collections, &names).unwrap();
        failed.operations[0].state = crate::models::OperationStateEnum::Success;
        failed.operations[1].state = crate::models::OperationStateEnum::Failure;

        let resumed = DeploymentPlan::from_failed_deployment(&collections, &failed).unwrap();
        assert_eq!(resumed.operations.len(), 1);
        assert_eq!(resumed.operations[0].operation, "mock_config");
        assert_eq!(resumed.deployment_type, DeploymentTypeEnum::Resume);
    }
}
