use rusqlite::{params, Connection, OptionalExtension};
use ulid::Ulid;

use crate::error::DeployError;
use crate::models::{ComponentVersionLog, DeploymentLog, DeploymentStateEnum, DeploymentTypeEnum, FilterTypeEnum, OperationLog, OperationStateEnum};

/// Persists a freshly planned `DeploymentLog`. If a PLANNED deployment
/// already exists its id is reused and its children replaced (the
/// `PlannedConflict` policy: overwrite, don't error). `log.id` is set to
/// the row id used.
pub fn persist_planned(conn: &Connection, log: &mut DeploymentLog) -> Result<(), DeployError> {
    let tx = conn.unchecked_transaction()?;

    let existing_planned: Option<i64> = tx
        .query_row(
            "SELECT id FROM deployments WHERE state = 'PLANNED'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let sources_json = log.sources.as_ref().map(|v| serde_json::to_string(v)).transpose()?;
    let targets_json = log.targets.as_ref().map(|v| serde_json::to_string(v)).transpose()?;
    let filter_type_str = log.filter_type.map(|f| f.as_str());

    let id = if let Some(existing_id) = existing_planned {
        tx.execute(
            "DELETE FROM operation_logs WHERE deployment_id = ?1",
            params![existing_id],
        )?;
        tx.execute(
            "DELETE FROM component_version_logs WHERE deployment_id = ?1",
            params![existing_id],
        )?;
        tx.execute(
            "UPDATE deployments SET sources=?1, targets=?2, filter_expression=?3, filter_type=?4,
                restart=?5, deployment_type=?6, state='PLANNED', start_time=NULL, end_time=NULL
             WHERE id = ?7",
            params![
                sources_json,
                targets_json,
                log.filter_expression,
                filter_type_str,
                log.restart,
                log.deployment_type.as_str(),
                existing_id
            ],
        )?;
        existing_id
    } else {
        tx.execute(
            "INSERT INTO deployments (sources, targets, filter_expression, filter_type, restart, deployment_type, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'PLANNED')",
            params![
                sources_json,
                targets_json,
                log.filter_expression,
                filter_type_str,
                log.restart,
                log.deployment_type.as_str(),
            ],
        )?;
        tx.last_insert_rowid()
    };

    for op in &mut log.operations {
        op.deployment_id = Some(id);
        tx.execute(
            "INSERT INTO operation_logs (id, deployment_id, plan_index, operation, state, start_time, end_time, logs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Ulid::new().to_string(),
                id,
                op.plan_index,
                op.operation,
                op.state.as_str(),
                op.start_time,
                op.end_time,
                op.logs,
            ],
        )?;
    }

    tx.commit()?;
    log.id = Some(id);
    Ok(())
}

pub fn update_operation_log(conn: &Connection, deployment_id: i64, op: &OperationLog) -> Result<(), DeployError> {
    conn.execute(
        "UPDATE operation_logs SET state=?1, start_time=?2, end_time=?3, logs=?4
         WHERE deployment_id=?5 AND plan_index=?6",
        params![op.state.as_str(), op.start_time, op.end_time, op.logs, deployment_id, op.plan_index],
    )?;
    Ok(())
}

pub fn insert_component_version_log(conn: &Connection, log: &ComponentVersionLog) -> Result<(), DeployError> {
    conn.execute(
        "INSERT INTO component_version_logs (id, deployment_id, emission_index, service, component, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            Ulid::new().to_string(),
            log.deployment_id,
            log.emission_index,
            log.service,
            log.component,
            log.version,
        ],
    )?;
    Ok(())
}

pub fn update_deployment_state(conn: &Connection, deployment_id: i64, log: &DeploymentLog) -> Result<(), DeployError> {
    conn.execute(
        "UPDATE deployments SET state=?1, start_time=?2, end_time=?3 WHERE id=?4",
        params![log.state.as_str(), log.start_time, log.end_time, deployment_id],
    )?;
    Ok(())
}

pub(super) fn row_to_deployment_log(
    conn: &Connection,
    id: i64,
    sources: Option<String>,
    targets: Option<String>,
    filter_expression: Option<String>,
    filter_type: Option<String>,
    restart: bool,
    deployment_type: String,
    state: String,
    start_time: Option<String>,
    end_time: Option<String>,
) -> Result<DeploymentLog, DeployError> {
    let operations = load_operation_logs(conn, id)?;
    let component_version = load_component_version_logs(conn, id)?;

    Ok(DeploymentLog {
        id: Some(id),
        sources: sources.map(|s| serde_json::from_str(&s)).transpose()?,
        targets: targets.map(|s| serde_json::from_str(&s)).transpose()?,
        filter_expression,
        filter_type: filter_type.and_then(|s| FilterTypeEnum::from_str(&s)),
        restart,
        deployment_type: DeploymentTypeEnum::from_str(&deployment_type)
            .ok_or_else(|| DeployError::database(format!("corrupt deployment_type '{deployment_type}'")))?,
        state: DeploymentStateEnum::from_str(&state)
            .ok_or_else(|| DeployError::database(format!("corrupt deployment state '{state}'")))?,
        start_time,
        end_time,
        operations,
        component_version,
    })
}

fn load_operation_logs(conn: &Connection, deployment_id: i64) -> Result<Vec<OperationLog>, DeployError> {
    let mut stmt = conn.prepare(
        "SELECT plan_index, operation, state, start_time, end_time, logs
         FROM operation_logs WHERE deployment_id = ?1 ORDER BY plan_index ASC",
    )?;
    let rows = stmt.query_map(params![deployment_id], |row| {
        Ok((
            row.get::<_, i32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Vec<u8>>(5)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (plan_index, operation, state, start_time, end_time, logs) = row?;
        out.push(OperationLog {
            deployment_id: Some(deployment_id),
            plan_index,
            operation,
            state: OperationStateEnum::from_str(&state)
                .ok_or_else(|| DeployError::database(format!("corrupt operation state '{state}'")))?,
            start_time,
            end_time,
            logs,
        });
    }
    Ok(out)
}

fn load_component_version_logs(conn: &Connection, deployment_id: i64) -> Result<Vec<ComponentVersionLog>, DeployError> {
    let mut stmt = conn.prepare(
        "SELECT emission_index, service, component, version
         FROM component_version_logs WHERE deployment_id = ?1 ORDER BY emission_index ASC",
    )?;
    let rows = stmt.query_map(params![deployment_id], |row| {
        Ok(ComponentVersionLog {
            deployment_id: Some(deployment_id),
            emission_index: row.get(0)?,
            service: row.get(1)?,
            component: row.get(2)?,
            version: row.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
