use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownNode,
    InvalidFilter,
    EmptyDeployment,
    InvalidDag,
    NotFound,
    ValidationError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownNode => "UNKNOWN_NODE",
            Self::InvalidFilter => "INVALID_FILTER",
            Self::EmptyDeployment => "EMPTY_DEPLOYMENT",
            Self::InvalidDag => "INVALID_DAG",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct DeployError {
    pub code: ErrorCode,
    pub message: String,
}

impl DeployError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_node(names: &[String]) -> Self {
        Self::new(
            ErrorCode::UnknownNode,
            format!("unknown node(s): {}", names.join(", ")),
        )
    }

    pub fn invalid_filter(expr: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidFilter,
            format!("invalid filter expression '{expr}': {reason}"),
        )
    }

    pub fn empty_deployment() -> Self {
        Self::new(
            ErrorCode::EmptyDeployment,
            "deployment selection produced no operations",
        )
    }

    pub fn invalid_dag(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDag, reason.into())
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::NotFound, format!("not found: {what}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for DeployError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<serde_yaml::Error> for DeployError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::validation(format!("invalid yaml: {e}"))
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(e: serde_json::Error) -> Self {
        Self::validation(format!("invalid json: {e}"))
    }
}

impl From<std::io::Error> for DeployError {
    fn from(e: std::io::Error) -> Self {
        Self::database(e.to_string())
    }
}
