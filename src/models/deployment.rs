use serde::{Deserialize, Serialize};

use super::enums::{DeploymentStateEnum, DeploymentTypeEnum, FilterTypeEnum, OperationStateEnum};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    pub deployment_id: Option<i64>,
    pub plan_index: i32,
    pub operation: String,
    pub state: OperationStateEnum,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub logs: Vec<u8>,
}

impl OperationLog {
    pub fn planned(plan_index: i32, operation: &str) -> Self {
        Self {
            deployment_id: None,
            plan_index,
            operation: operation.to_string(),
            state: OperationStateEnum::Planned,
            start_time: None,
            end_time: None,
            logs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentVersionLog {
    pub deployment_id: Option<i64>,
    pub emission_index: i32,
    pub service: String,
    pub component: Option<String>,
    pub version: String,
}

impl ComponentVersionLog {
    /// First 7 characters of `version`, the display projection spec.md calls
    /// the "short form".
    pub fn short_version(&self) -> &str {
        let end = self.version.char_indices().nth(7).map(|(i, _)| i).unwrap_or(self.version.len());
        &self.version[..end]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentLog {
    pub id: Option<i64>,
    pub sources: Option<Vec<String>>,
    pub targets: Option<Vec<String>>,
    pub filter_expression: Option<String>,
    pub filter_type: Option<FilterTypeEnum>,
    pub restart: bool,
    pub deployment_type: DeploymentTypeEnum,
    pub state: DeploymentStateEnum,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub operations: Vec<OperationLog>,
    pub component_version: Vec<ComponentVersionLog>,
}

impl DeploymentLog {
    pub fn planned(deployment_type: DeploymentTypeEnum, operation_names: &[String]) -> Self {
        let operations = operation_names
            .iter()
            .enumerate()
            .map(|(i, name)| OperationLog::planned(i as i32, name))
            .collect();
        Self {
            id: None,
            sources: None,
            targets: None,
            filter_expression: None,
            filter_type: None,
            restart: false,
            deployment_type,
            state: DeploymentStateEnum::Planned,
            start_time: None,
            end_time: None,
            operations,
            component_version: Vec::new(),
        }
    }

    /// Index of the first operation in FAILURE state, if any.
    pub fn first_failure_index(&self) -> Option<usize> {
        self.operations.iter().position(|op| op.state == OperationStateEnum::Failure)
    }
}
