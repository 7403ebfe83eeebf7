use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde_json::json;

use crate::cli::commands::PlanCommands;
use crate::collections::Collections;
use crate::db::{connection, deployment_repo, query};
use crate::error::DeployError;
use crate::graph::dag::Dag;
use crate::models::{DeploymentStateEnum, FilterTypeEnum};
use crate::output;
use crate::variables::{ClusterVariables, YamlClusterVariables};

pub fn run(cmd: PlanCommands, json_output: bool, collections_path: Option<&Path>, vars_path: Option<&Path>) -> i32 {
    let result = run_inner(cmd, json_output, collections_path, vars_path);
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

/// Resolves an explicit `--collections`/`--vars` flag, falling back to the
/// `.tdp/` convention under the git root (spec.md §6: "collection path
/// list ... consumed by the CLI layer").
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

fn load_dag(collections_path: Option<&Path>) -> Result<(Collections, Dag), DeployError> {
    let path = resolve_collections_path(collections_path)?;
    let collections = Collections::load(&path)?;
    let dag = Dag::new(&collections)?;
    Ok((collections, dag))
}

fn run_inner(cmd: PlanCommands, json_output: bool, collections_path: Option<&Path>, vars_path: Option<&Path>) -> Result<i32, DeployError> {
    match cmd {
        PlanCommands::Dag { sources, targets, filter, glob, regex, restart } => {
            let filter_type = if regex {
                Some(FilterTypeEnum::Regex)
            } else if glob {
                Some(FilterTypeEnum::Glob)
            } else {
                None
            };
            run_plan_dag(sources, targets, filter, filter_type, restart, json_output, collections_path)
        }
        PlanCommands::Ops { operations } => run_plan_ops(operations, json_output, collections_path),
        PlanCommands::Resume => run_plan_resume(json_output, collections_path),
        PlanCommands::Reconfigure { restart } => run_plan_reconfigure(restart, json_output, collections_path, vars_path),
        PlanCommands::Show => run_plan_show(json_output),
    }
}

fn persist_and_report(conn: &Connection, mut log: crate::models::DeploymentLog, json_output: bool) -> Result<i32, DeployError> {
    let replaced = query::get_planned_deployment(conn)?.is_some();
    deployment_repo::persist_planned(conn, &mut log)?;

    if json_output {
        let mut data = output::json::deployment_json(&log);
        data["replaced"] = json!(replaced);
        println!("{}", serde_json::to_string_pretty(&output::json::success(data)).unwrap());
    } else {
        output::text::print_deployment(&log);
        if replaced {
            println!("  (replaced the previously PLANNED deployment)");
        }
        println!("Deployment plan successfully created.");
    }
    Ok(0)
}

fn run_plan_dag(
    sources: Option<Vec<String>>,
    targets: Option<Vec<String>>,
    filter: Option<String>,
    filter_type: Option<FilterTypeEnum>,
    restart: bool,
    json_output: bool,
    collections_path: Option<&Path>,
) -> Result<i32, DeployError> {
    let (_collections, dag) = load_dag(collections_path)?;
    let log = crate::plan::DeploymentPlan::from_dag(
        &dag,
        sources.as_deref(),
        targets.as_deref(),
        filter.as_deref(),
        filter_type,
        restart,
    )?;
    let conn = connection::open_db()?;
    persist_and_report(&conn, log, json_output)
}

fn run_plan_ops(operations: Vec<String>, json_output: bool, collections_path: Option<&Path>) -> Result<i32, DeployError> {
    let (collections, _dag) = load_dag(collections_path)?;
    let log = crate::plan::DeploymentPlan::from_operations(&collections, &operations)?;
    let conn = connection::open_db()?;
    persist_and_report(&conn, log, json_output)
}

fn run_plan_resume(json_output: bool, collections_path: Option<&Path>) -> Result<i32, DeployError> {
    let (collections, _dag) = load_dag(collections_path)?;
    let conn = connection::open_db()?;
    let failed = query::get_last_deployment(&conn)?;
    if failed.state != DeploymentStateEnum::Failure {
        return Err(DeployError::validation(
            "the last deployment did not fail; nothing to resume",
        ));
    }
    let log = crate::plan::DeploymentPlan::from_failed_deployment(&collections, &failed)?;
    persist_and_report(&conn, log, json_output)
}

fn run_plan_reconfigure(
    restart: bool,
    json_output: bool,
    collections_path: Option<&Path>,
    vars_path: Option<&Path>,
) -> Result<i32, DeployError> {
    let (_collections, dag) = load_dag(collections_path)?;
    let vars = YamlClusterVariables::load(&resolve_vars_path(vars_path)?)?;
    let conn = connection::open_db()?;
    let deployed = query::latest_success_component_versions(&conn)?;

    // Disabled pending rework (spec.md §9): compute what the plan would be,
    // but report it as not enabled rather than persisting it.
    let would_plan = crate::plan::DeploymentPlan::from_reconfigure(&dag, &vars as &dyn ClusterVariables, &deployed, restart);
    let operation_count = would_plan.map(|log| log.operations.len()).unwrap_or(0);

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "enabled": false,
                "would_plan_operation_count": operation_count,
                "message": "reconfigure is implemented but not enabled; see DESIGN.md",
            })))
            .unwrap()
        );
    } else {
        println!("reconfigure is implemented but not enabled (see DESIGN.md).");
        println!("would currently plan {operation_count} operation(s).");
    }
    Ok(0)
}

fn run_plan_show(json_output: bool) -> Result<i32, DeployError> {
    let conn = connection::open_db()?;
    let log = match query::get_planned_deployment(&conn)? {
        Some(log) => log,
        None => query::get_last_deployment(&conn)?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output::json::success(output::json::deployment_json(&log))).unwrap());
    } else {
        output::text::print_deployment(&log);
        println!();
        output::text::print_operation_list(&log.operations);
    }
    Ok(0)
}
