use clap::Parser;
use std::process;

use tdp::cli;
use tdp::cli::commands::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let collections_path = cli_args.collections.clone();
    let vars_path = cli_args.vars.clone();

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Plan(cmd) => cli::plan::run(cmd, json_output, collections_path.as_deref(), vars_path.as_deref()),
        Commands::Deploy => cli::deploy::run(json_output, collections_path.as_deref(), vars_path.as_deref()),
        Commands::ServiceVersions => cli::service_versions::run(json_output),
        Commands::Deployment(cmd) => cli::deployment::run(cmd, json_output),
    };

    process::exit(exit_code);
}
