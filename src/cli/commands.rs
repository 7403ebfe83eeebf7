use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "tdp",
    version = VERSION,
    about = "Deployment DAG planning & execution engine",
    after_help = "\
NOTE:
  Requires a git repository. DB is stored at <git-root>/.tdp/tdp.db
  Run `tdp init` before any other command.

  --collections and --vars default to <git-root>/.tdp/collections.yaml
  and <git-root>/.tdp/vars.yaml when omitted.

EXIT CODES:
  0  Success (plan created, deployment ran to completion or recorded failure)
  1  Error (unknown node, invalid filter, empty selection, not found, ...)

PLANNED-DEPLOYMENT RULE:
  At most one deployment is ever in state PLANNED. Planning again while a
  PLANNED deployment exists overwrites it in place (same id); this is not
  an error.

RESUME:
  `plan resume` builds a new plan from the failed operation and every
  operation after it in the most recent FAILURE deployment, in order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the operation catalog YAML (default: <git-root>/.tdp/collections.yaml)
    #[arg(long, global = true)]
    pub collections: Option<PathBuf>,

    /// Path to the cluster variables YAML (default: <git-root>/.tdp/vars.yaml)
    #[arg(long, global = true)]
    pub vars: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize tdp in this repository
    Init,

    /// Deployment planning
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Run the PLANNED deployment to completion
    Deploy,

    /// Show the latest successfully deployed version per (service, component)
    ServiceVersions,

    /// Inspect past deployments
    #[command(subcommand)]
    Deployment(DeploymentCommands),
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Plan from a DAG selection (sources/targets/filter/restart)
    Dag {
        /// Nodes where the run starts (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sources: Option<Vec<String>>,
        /// Nodes where the run stops (comma-separated)
        #[arg(long, value_delimiter = ',')]
        targets: Option<Vec<String>>,
        /// Match filter expression against operation names
        #[arg(long)]
        filter: Option<String>,
        /// Interpret --filter as a shell glob (default)
        #[arg(long, conflicts_with = "regex")]
        glob: bool,
        /// Interpret --filter as a regular expression
        #[arg(long, conflicts_with = "glob")]
        regex: bool,
        /// Replace `*_start` operations with `*_restart` where available
        #[arg(long)]
        restart: bool,
    },
    /// Plan from an explicit, verbatim operation list
    Ops {
        /// Operation names, executed in the order given
        operations: Vec<String>,
    },
    /// Plan a resume of the most recent failed deployment
    Resume,
    /// Plan a reconfiguration from stale component versions (not enabled)
    Reconfigure {
        #[arg(long)]
        restart: bool,
    },
    /// Show the current PLANNED deployment, or the last deployment if none
    Show,
}

#[derive(Subcommand)]
pub enum DeploymentCommands {
    /// List deployments, most recent first
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Show a single deployment by id
    Show {
        id: i64,
    },
}
