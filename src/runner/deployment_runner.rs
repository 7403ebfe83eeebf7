use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::collections::Collections;
use crate::models::{ComponentVersionLog, DeploymentLog, DeploymentStateEnum, OperationLog, OperationStateEnum};
use crate::variables::ClusterVariables;

use super::executor::{run_guarded, Executor};

type Scope = (String, Option<String>);

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Drives a `DeploymentLog` through its plan one operation at a time.
/// Construction captures the collaborators (collections, executor, cluster
/// variables) once; `run` is cheap and may be called for multiple logs.
pub struct DeploymentRunner<'a> {
    collections: &'a Collections,
    executor: &'a dyn Executor,
    cluster_variables: &'a dyn ClusterVariables,
    stale_components: HashMap<Scope, String>,
}

impl<'a> DeploymentRunner<'a> {
    pub fn new(
        collections: &'a Collections,
        executor: &'a dyn Executor,
        cluster_variables: &'a dyn ClusterVariables,
        stale_components: HashMap<Scope, String>,
    ) -> Self {
        Self {
            collections,
            executor,
            cluster_variables,
            stale_components,
        }
    }

    pub fn run(&self, deployment_log: DeploymentLog) -> DeploymentIterator<'a> {
        DeploymentIterator {
            collections: self.collections,
            executor: self.executor,
            cluster_variables: self.cluster_variables,
            last_configured: self.stale_components.clone(),
            emitted: HashSet::new(),
            next_emission_index: 0,
            deployment_log,
            next_index: 0,
            started: false,
            stopped: false,
        }
    }
}

/// The lazy pull-based sequence of `(OperationLog, ComponentVersionLog?)`
/// steps. Consumers drive the deployment by pulling; the embedded
/// `deployment_log` reflects progress after every yielded step.
pub struct DeploymentIterator<'a> {
    collections: &'a Collections,
    executor: &'a dyn Executor,
    cluster_variables: &'a dyn ClusterVariables,
    last_configured: HashMap<Scope, String>,
    emitted: HashSet<Scope>,
    next_emission_index: i32,
    deployment_log: DeploymentLog,
    next_index: usize,
    started: bool,
    stopped: bool,
}

impl<'a> DeploymentIterator<'a> {
    pub fn deployment_log(&self) -> &DeploymentLog {
        &self.deployment_log
    }

    pub fn deployment_log_mut(&mut self) -> &mut DeploymentLog {
        &mut self.deployment_log
    }

    /// Consumes the iterator, returning the finalized log. Convenience for
    /// callers that don't need to inspect intermediate steps.
    pub fn into_deployment_log(mut self) -> DeploymentLog {
        for _ in self.by_ref() {}
        self.deployment_log
    }

    fn handle_emission(&mut self, service: &str, component: Option<&str>, action: &str, state: OperationStateEnum) -> Option<ComponentVersionLog> {
        let key: Scope = (service.to_string(), component.map(|s| s.to_string()));
        match action {
            "config" => {
                if state == OperationStateEnum::Success {
                    if let Some(hash) = self.cluster_variables.get_hash(service, component) {
                        self.last_configured.insert(key, hash);
                    }
                }
                None
            }
            "start" | "restart" => {
                if state != OperationStateEnum::Success {
                    return None;
                }
                if self.emitted.contains(&key) {
                    return None;
                }
                let hash = self.last_configured.get(&key)?.clone();
                self.emitted.insert(key.clone());
                let index = self.next_emission_index;
                self.next_emission_index += 1;
                Some(ComponentVersionLog {
                    deployment_id: self.deployment_log.id,
                    emission_index: index,
                    service: key.0,
                    component: key.1,
                    version: hash,
                })
            }
            _ => None,
        }
    }
}

impl<'a> Iterator for DeploymentIterator<'a> {
    type Item = (OperationLog, Option<ComponentVersionLog>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped || self.next_index >= self.deployment_log.operations.len() {
            return None;
        }

        if !self.started {
            self.deployment_log.state = DeploymentStateEnum::Running;
            self.deployment_log.start_time = Some(now());
            self.started = true;
        }

        let idx = self.next_index;
        let name = self.deployment_log.operations[idx].operation.clone();
        let operation = self.collections.get(&name).cloned();

        self.deployment_log.operations[idx].state = OperationStateEnum::Running;
        self.deployment_log.operations[idx].start_time = Some(now());

        let (state, logs, service, component, action) = match operation {
            None => (
                OperationStateEnum::Failure,
                format!("unknown operation '{name}'").into_bytes(),
                String::new(),
                None,
                String::new(),
            ),
            Some(op) => {
                let host = op.host_names.first().map(|s| s.as_str());
                let (state, logs) = if op.noop {
                    (OperationStateEnum::Success, Vec::new())
                } else {
                    run_guarded(self.executor, &op, host, None)
                };
                (state, logs, op.service.clone(), op.component.clone(), op.action.clone())
            }
        };

        self.deployment_log.operations[idx].state = state;
        self.deployment_log.operations[idx].logs = logs;
        self.deployment_log.operations[idx].end_time = Some(now());

        let version_log = self.handle_emission(&service, component.as_deref(), &action, state);
        if let Some(ref v) = version_log {
            self.deployment_log.component_version.push(v.clone());
        }

        self.next_index += 1;

        if state == OperationStateEnum::Failure {
            self.deployment_log.state = DeploymentStateEnum::Failure;
            self.deployment_log.end_time = Some(now());
            self.stopped = true;
        } else if self.next_index == self.deployment_log.operations.len() {
            self.deployment_log.state = DeploymentStateEnum::Success;
            self.deployment_log.end_time = Some(now());
        }

        Some((self.deployment_log.operations[idx].clone(), version_log))
    }
}
