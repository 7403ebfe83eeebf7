use rusqlite::Connection;
use tracing::debug;

use crate::error::DeployError;

pub fn run_migrations(conn: &Connection) -> Result<(), DeployError> {
    debug!("running migrations");
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS deployments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sources TEXT,
            targets TEXT,
            filter_expression TEXT,
            filter_type TEXT
                CHECK (filter_type IS NULL OR filter_type IN ('GLOB', 'REGEX')),
            restart INTEGER NOT NULL DEFAULT 0,
            deployment_type TEXT NOT NULL
                CHECK (deployment_type IN ('DAG', 'OPERATIONS', 'RESUME', 'RECONFIGURE')),
            state TEXT NOT NULL DEFAULT 'PLANNED'
                CHECK (state IN ('PLANNED', 'RUNNING', 'SUCCESS', 'FAILURE')),
            start_time TEXT,
            end_time TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_deployments_one_planned
            ON deployments(state) WHERE state = 'PLANNED';

        CREATE TABLE IF NOT EXISTS operation_logs (
            id TEXT PRIMARY KEY,
            deployment_id INTEGER NOT NULL REFERENCES deployments(id) ON DELETE CASCADE,
            plan_index INTEGER NOT NULL,
            operation TEXT NOT NULL,
            state TEXT NOT NULL
                CHECK (state IN ('PLANNED', 'RUNNING', 'SUCCESS', 'FAILURE', 'HELD')),
            start_time TEXT,
            end_time TEXT,
            logs BLOB NOT NULL DEFAULT '',
            UNIQUE (deployment_id, plan_index)
        );

        CREATE TABLE IF NOT EXISTS component_version_logs (
            id TEXT PRIMARY KEY,
            deployment_id INTEGER NOT NULL REFERENCES deployments(id) ON DELETE CASCADE,
            emission_index INTEGER NOT NULL,
            service TEXT NOT NULL,
            component TEXT,
            version TEXT NOT NULL,
            UNIQUE (deployment_id, emission_index)
        );

        CREATE INDEX IF NOT EXISTS idx_operation_logs_deployment
            ON operation_logs(deployment_id, plan_index);
        CREATE INDEX IF NOT EXISTS idx_component_version_logs_deployment
            ON component_version_logs(deployment_id, emission_index);
        CREATE INDEX IF NOT EXISTS idx_component_version_logs_scope
            ON component_version_logs(service, component, deployment_id);
        ",
    )?;
    Ok(())
}
