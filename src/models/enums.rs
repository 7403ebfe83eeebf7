use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterTypeEnum {
    Glob,
    Regex,
}

impl FilterTypeEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glob => "GLOB",
            Self::Regex => "REGEX",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GLOB" => Some(Self::Glob),
            "REGEX" => Some(Self::Regex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentTypeEnum {
    Dag,
    Operations,
    Resume,
    Reconfigure,
}

impl DeploymentTypeEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dag => "DAG",
            Self::Operations => "OPERATIONS",
            Self::Resume => "RESUME",
            Self::Reconfigure => "RECONFIGURE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DAG" => Some(Self::Dag),
            "OPERATIONS" => Some(Self::Operations),
            "RESUME" => Some(Self::Resume),
            "RECONFIGURE" => Some(Self::Reconfigure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStateEnum {
    Planned,
    Running,
    Success,
    Failure,
}

impl DeploymentStateEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(Self::Planned),
            "RUNNING" => Some(Self::Running),
            "SUCCESS" => Some(Self::Success),
            "FAILURE" => Some(Self::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStateEnum {
    Planned,
    Running,
    Success,
    Failure,
    Held,
}

impl OperationStateEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Held => "HELD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(Self::Planned),
            "RUNNING" => Some(Self::Running),
            "SUCCESS" => Some(Self::Success),
            "FAILURE" => Some(Self::Failure),
            "HELD" => Some(Self::Held),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}
