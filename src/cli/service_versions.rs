use serde_json::json;

use crate::db::{connection, query};
use crate::error::DeployError;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    let result = run_inner(json_output);
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

fn run_inner(json_output: bool) -> Result<i32, DeployError> {
    let conn = connection::open_db()?;
    let versions = query::latest_success_component_versions(&conn)?;

    if json_output {
        let versions_json: Vec<_> = versions.iter().map(output::json::component_version_short_json).collect();
        println!("{}", serde_json::to_string_pretty(&output::json::success(json!({ "versions": versions_json }))).unwrap());
    } else {
        println!("Service versions:");
        output::text::print_component_versions(&versions);
    }
    Ok(0)
}
