use serde_json::{json, Value};

use crate::error::DeployError;
use crate::models::{ComponentVersionLog, DeploymentLog, OperationLog};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &DeployError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn operation_log_json(op: &OperationLog) -> Value {
    json!({
        "operation": op.operation,
        "state": op.state.as_str(),
        "start_time": op.start_time,
        "end_time": op.end_time,
    })
}

pub fn component_version_json(v: &ComponentVersionLog) -> Value {
    json!({
        "deployment_id": v.deployment_id,
        "service": v.service,
        "component": v.component,
        "version": v.version,
    })
}

/// The §3 "short form" display projection: version truncated to 7 characters.
pub fn component_version_short_json(v: &ComponentVersionLog) -> Value {
    json!({
        "deployment_id": v.deployment_id,
        "service": v.service,
        "component": v.component,
        "version": v.short_version(),
    })
}

pub fn deployment_json(log: &DeploymentLog) -> Value {
    json!({
        "id": log.id,
        "deployment_type": log.deployment_type.as_str(),
        "state": log.state.as_str(),
        "sources": log.sources,
        "targets": log.targets,
        "filter_expression": log.filter_expression,
        "filter_type": log.filter_type.map(|f| f.as_str()),
        "restart": log.restart,
        "start_time": log.start_time,
        "end_time": log.end_time,
        "operations": log.operations.iter().map(operation_log_json).collect::<Vec<_>>(),
        "component_version": log.component_version.iter().map(component_version_json).collect::<Vec<_>>(),
    })
}
