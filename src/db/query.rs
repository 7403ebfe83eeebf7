use rusqlite::{params, Connection, OptionalExtension};

use crate::error::DeployError;
use crate::models::{ComponentVersionLog, DeploymentLog, OperationLog, OperationStateEnum};

use super::deployment_repo::row_to_deployment_log;

/// For each `(service, component)` pair that has ever appeared in a
/// `ComponentVersionLog`, the row with the maximum `deployment_id` —
/// service-level rows (`component IS NULL`) are their own group, per
/// spec.md §4.G. Ordered by `deployment_id` descending, then service,
/// then component, matching `original_source/tdp/cli/queries.py`'s
/// max-subquery-join shape re-expressed in SQL.
pub fn latest_success_component_versions(conn: &Connection) -> Result<Vec<ComponentVersionLog>, DeployError> {
    let mut stmt = conn.prepare(
        "SELECT cvl.deployment_id, cvl.emission_index, cvl.service, cvl.component, cvl.version
         FROM component_version_logs cvl
         INNER JOIN (
             SELECT service, component, MAX(deployment_id) AS max_id
             FROM component_version_logs
             GROUP BY service, component
         ) latest
         ON cvl.service = latest.service
         AND cvl.deployment_id = latest.max_id
         AND (cvl.component = latest.component OR (cvl.component IS NULL AND latest.component IS NULL))
         ORDER BY cvl.deployment_id DESC, cvl.service ASC, cvl.component ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ComponentVersionLog {
            deployment_id: Some(row.get(0)?),
            emission_index: row.get(1)?,
            service: row.get(2)?,
            component: row.get(3)?,
            version: row.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Most recent deployments first, with `operations`/`component_version`
/// eager-loaded, mirroring the original's `joinedload`.
pub fn get_deployments(conn: &Connection, limit: i64, offset: i64) -> Result<Vec<DeploymentLog>, DeployError> {
    let mut stmt = conn.prepare(
        "SELECT id, sources, targets, filter_expression, filter_type, restart, deployment_type, state, start_time, end_time
         FROM deployments ORDER BY id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let ids = stmt.query_map(params![limit, offset], |row| row.get::<_, i64>(0))?;
    let mut out = Vec::new();
    for id in ids {
        out.push(get_deployment(conn, id?)?);
    }
    Ok(out)
}

pub fn get_deployment(conn: &Connection, id: i64) -> Result<DeploymentLog, DeployError> {
    conn.query_row(
        "SELECT id, sources, targets, filter_expression, filter_type, restart, deployment_type, state, start_time, end_time
         FROM deployments WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        },
    )
    .optional()?
    .ok_or_else(|| DeployError::not_found(format!("deployment id {id}")))
    .and_then(|(id, sources, targets, filter_expression, filter_type, restart, deployment_type, state, start_time, end_time)| {
        row_to_deployment_log(conn, id, sources, targets, filter_expression, filter_type, restart, deployment_type, state, start_time, end_time)
    })
}

pub fn get_last_deployment(conn: &Connection) -> Result<DeploymentLog, DeployError> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM deployments ORDER BY id DESC LIMIT 1", [], |row| row.get(0))
        .optional()?;
    match id {
        Some(id) => get_deployment(conn, id),
        None => Err(DeployError::not_found("any deployment")),
    }
}

/// The unique row with state PLANNED, or `None` — this is not a
/// `NotFound` error, since having no planned deployment is routine.
pub fn get_planned_deployment(conn: &Connection) -> Result<Option<DeploymentLog>, DeployError> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM deployments WHERE state = 'PLANNED'", [], |row| row.get(0))
        .optional()?;
    match id {
        Some(id) => Ok(Some(get_deployment(conn, id)?)),
        None => Ok(None),
    }
}

pub fn get_operation_log(conn: &Connection, deployment_id: i64, operation_name: &str) -> Result<OperationLog, DeployError> {
    conn.query_row(
        "SELECT plan_index, operation, state, start_time, end_time, logs
         FROM operation_logs WHERE deployment_id = ?1 AND operation = ?2
         ORDER BY plan_index ASC LIMIT 1",
        params![deployment_id, operation_name],
        |row| {
            Ok(OperationLog {
                deployment_id: Some(deployment_id),
                plan_index: row.get(0)?,
                operation: row.get(1)?,
                state: OperationStateEnum::from_str(&row.get::<_, String>(2)?).unwrap_or(OperationStateEnum::Planned),
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                logs: row.get(5)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| DeployError::not_found(format!("operation '{operation_name}' in deployment {deployment_id}")))
}
