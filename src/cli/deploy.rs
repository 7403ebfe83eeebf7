use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::collections::Collections;
use crate::db::{connection, deployment_repo, query};
use crate::error::DeployError;
use crate::output;
use crate::runner::{AlwaysSucceedExecutor, DeploymentRunner, Executor};
use crate::variables::{ClusterVariables, YamlClusterVariables};

pub fn run(json_output: bool, collections_path: Option<&Path>, vars_path: Option<&Path>) -> i32 {
    let result = run_inner(json_output, collections_path, vars_path);
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&output::json::error(&e)).unwrap());
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

fn resolve_collections_path(flag: Option<&Path>) -> Result<PathBuf, DeployError> {
    match flag {
        Some(p) => Ok(p.to_path_buf()),
        None => connection::collections_path(),
    }
}

fn resolve_vars_path(flag: Option<&Path>) -> Result<PathBuf, DeployError> {
    match flag {
        Some(p) => Ok(p.to_path_buf()),
        None => connection::vars_path(),
    }
}

fn run_inner(json_output: bool, collections_path: Option<&Path>, vars_path: Option<&Path>) -> Result<i32, DeployError> {
    let conn = connection::open_db()?;
    let planned = query::get_planned_deployment(&conn)?
        .ok_or_else(|| DeployError::not_found("a PLANNED deployment (run `tdp plan ...` first)"))?;

    let collections = Collections::load(&resolve_collections_path(collections_path)?)?;
    let vars = YamlClusterVariables::load(&resolve_vars_path(vars_path)?)?;
    let stale_components = seed_stale_components(&conn, &vars)?;

    // The real executor backend (a playbook runner) is out of scope for this
    // crate (spec.md §1); `AlwaysSucceedExecutor` stands in so `tdp deploy`
    // has something to drive end to end.
    let executor = AlwaysSucceedExecutor;
    let finished = drive(&conn, &collections, &executor, &vars, stale_components, planned)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output::json::success(output::json::deployment_json(&finished))).unwrap());
    } else {
        output::text::print_deployment(&finished);
        println!();
        output::text::print_operation_list(&finished.operations);
    }
    Ok(0)
}

type Scope = (String, Option<String>);

/// Seeds the runner's `last_configured` map with only the components that
/// are actually *stale* (glossary: variables changed since the last
/// successful deploy). A component whose stored hash still matches the
/// current variables hash is not stale — seeding it anyway would let a
/// plan with no `*_config` of its own (e.g. a bare `*_restart`) emit a
/// `ComponentVersionLog` purely from history, which violates spec.md §8
/// invariant 5.
fn seed_stale_components(conn: &Connection, vars: &dyn ClusterVariables) -> Result<HashMap<Scope, String>, DeployError> {
    let mut map = HashMap::new();
    for v in query::latest_success_component_versions(conn)? {
        let current_hash = vars.get_hash(&v.service, v.component.as_deref());
        if current_hash.as_deref() != Some(v.version.as_str()) {
            map.insert((v.service, v.component), v.version);
        }
    }
    Ok(map)
}

/// Pulls the iterator to completion, persisting each yielded step as it
/// arrives — the pattern spec.md §9 calls out: the runner only holds the
/// log in memory, the caller is responsible for durability between steps.
fn drive(
    conn: &Connection,
    collections: &Collections,
    executor: &dyn Executor,
    vars: &YamlClusterVariables,
    stale_components: HashMap<Scope, String>,
    planned: crate::models::DeploymentLog,
) -> Result<crate::models::DeploymentLog, DeployError> {
    let runner = DeploymentRunner::new(collections, executor, vars, stale_components);
    let deployment_id = planned.id.ok_or_else(|| DeployError::validation("planned deployment has no id"))?;
    info!(deployment_id, "starting deployment");

    let mut iter = runner.run(planned);
    while let Some((op_log, version_log)) = iter.next() {
        deployment_repo::update_operation_log(conn, deployment_id, &op_log)?;
        if let Some(ref v) = version_log {
            deployment_repo::insert_component_version_log(conn, v)?;
        }
        if op_log.state == crate::models::OperationStateEnum::Failure {
            warn!(deployment_id, operation = %op_log.operation, "operation failed");
        }
        deployment_repo::update_deployment_state(conn, deployment_id, iter.deployment_log())?;
    }

    let finished = iter.into_deployment_log();
    info!(deployment_id, state = finished.state.as_str(), "deployment finished");
    Ok(finished)
}
