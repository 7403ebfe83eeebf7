use serde_json::json;

use crate::cli::commands::DeploymentCommands;
use crate::db::{connection, query};
use crate::error::DeployError;
use crate::output;

pub fn run(cmd: DeploymentCommands, json_output: bool) -> i32 {
    let result = run_inner(cmd, json_output);
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

fn run_inner(cmd: DeploymentCommands, json_output: bool) -> Result<i32, DeployError> {
    match cmd {
        DeploymentCommands::List { limit, offset } => run_list(limit, offset, json_output),
        DeploymentCommands::Show { id } => run_show(id, json_output),
    }
}

fn run_list(limit: i64, offset: i64, json_output: bool) -> Result<i32, DeployError> {
    let conn = connection::open_db()?;
    let deployments = query::get_deployments(&conn, limit, offset)?;

    if json_output {
        let deployments_json: Vec<_> = deployments.iter().map(output::json::deployment_json).collect();
        println!("{}", serde_json::to_string_pretty(&output::json::success(json!({ "deployments": deployments_json }))).unwrap());
    } else {
        output::text::print_deployment_list(&deployments);
    }
    Ok(0)
}

fn run_show(id: i64, json_output: bool) -> Result<i32, DeployError> {
    let conn = connection::open_db()?;
    let log = query::get_deployment(&conn, id)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output::json::success(output::json::deployment_json(&log))).unwrap());
    } else {
        output::text::print_deployment(&log);
        println!();
        output::text::print_operation_list(&log.operations);
    }
    Ok(0)
}
