#[allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

const COLLECTIONS_YAML: &str = "\
operations:
  mock_install: { host_names: [node1] }
  mock_config: { depends_on: [mock_install] }
  mock_start: { depends_on: [mock_config] }
  mock_restart: { depends_on: [mock_config] }
  mock_init: { noop: true, depends_on: [mock_start] }
  mock_node_config: { component: node, depends_on: [mock_install] }
  mock_node_start: { depends_on: [mock_node_config] }
  mock_node_restart: { depends_on: [mock_node_config] }
";

const VARS_YAML: &str = "\
mock:
  _service: { version: 1 }
  node: { version: 1 }
";

struct TestEnv {
    dir: TempDir,
    collections_path: PathBuf,
    vars_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        std::process::Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .output()
            .expect("git init");

        let collections_path = dir.path().join("collections.yaml");
        fs::write(&collections_path, COLLECTIONS_YAML).expect("write collections");
        let vars_path = dir.path().join("vars.yaml");
        fs::write(&vars_path, VARS_YAML).expect("write vars");

        Self { dir, collections_path, vars_path }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tdp").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd.arg("--collections").arg(&self.collections_path);
        cmd.arg("--vars").arg(&self.vars_path);
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn init(&self) {
        self.run_ok(&["init"]);
    }
}

// ─── tests ─────────────────────────────────────────────────────────

#[test]
fn init_creates_database() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["path"].as_str().unwrap().ends_with("tdp.db"));
    assert!(env.dir.path().join(".tdp/tdp.db").exists());
}

#[test]
fn plan_dag_full_selection_plans_all_operations() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_ok(&["plan", "dag"]);
    assert_eq!(v["data"]["operations"].as_array().unwrap().len(), 8);
    assert_eq!(v["data"]["deployment_type"], "DAG");
    assert_eq!(v["data"]["state"], "PLANNED");
}

#[test]
fn plan_dag_with_filter_narrows_selection() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_ok(&["plan", "dag", "--targets", "mock_init", "--filter", "*_install"]);
    let ops = v["data"]["operations"].as_array().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0]["operation"], "mock_install");
}

#[test]
fn plan_dag_unknown_source_is_an_error() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_err(&["plan", "dag", "--sources", "nope"]);
    assert_eq!(v["error"]["code"], "UNKNOWN_NODE");
}

#[test]
fn plan_ops_preserves_order_and_runs_to_success() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_ok(&["plan", "ops", "mock_config", "mock_install"]);
    let ops = v["data"]["operations"].as_array().unwrap();
    assert_eq!(ops[0]["operation"], "mock_config");
    assert_eq!(ops[1]["operation"], "mock_install");

    let deployed = env.run_ok(&["deploy"]);
    assert_eq!(deployed["data"]["state"], "SUCCESS");
    let deployed_ops = deployed["data"]["operations"].as_array().unwrap();
    assert_eq!(deployed_ops[0]["operation"], "mock_config");
    assert_eq!(deployed_ops[1]["operation"], "mock_install");
}

#[test]
fn deploy_without_a_planned_deployment_is_not_found() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_err(&["deploy"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[test]
fn full_dag_deploy_emits_two_component_version_logs() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "dag"]);
    let v = env.run_ok(&["deploy"]);
    assert_eq!(v["data"]["state"], "SUCCESS");
    assert_eq!(v["data"]["component_version"].as_array().unwrap().len(), 2);
}

#[test]
fn bare_restart_after_a_prior_deploy_emits_no_version_log_when_vars_are_unchanged() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "dag"]);
    env.run_ok(&["deploy"]);

    // Nothing in the variables changed, so `mock` and `mock.node` are not
    // stale. A later deployment containing only `mock_restart` (no config
    // of its own) must not emit a component-version log purely from
    // history.
    env.run_ok(&["plan", "ops", "mock_restart"]);
    let v = env.run_ok(&["deploy"]);
    assert_eq!(v["data"]["state"], "SUCCESS");
    assert_eq!(v["data"]["component_version"].as_array().unwrap().len(), 0);
}

#[test]
fn noop_only_deployment_emits_no_version_logs() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "ops", "mock_init"]);
    let v = env.run_ok(&["deploy"]);
    assert_eq!(v["data"]["state"], "SUCCESS");
    assert_eq!(v["data"]["operations"].as_array().unwrap().len(), 1);
    assert_eq!(v["data"]["component_version"].as_array().unwrap().len(), 0);
}

#[test]
fn planning_again_replaces_the_planned_deployment_in_place() {
    let env = TestEnv::new();
    env.init();
    let first = env.run_ok(&["plan", "ops", "mock_install"]);
    let first_id = first["data"]["id"].clone();

    let second = env.run_ok(&["plan", "ops", "mock_config", "mock_install"]);
    assert_eq!(second["data"]["id"], first_id);
    assert_eq!(second["data"]["replaced"], true);
    assert_eq!(second["data"]["operations"].as_array().unwrap().len(), 2);
}

#[test]
fn plan_show_reports_the_planned_deployment() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "ops", "mock_install"]);
    let v = env.run_ok(&["plan", "show"]);
    assert_eq!(v["data"]["state"], "PLANNED");
}

#[test]
fn plan_resume_without_a_failed_deployment_is_an_error() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "ops", "mock_install"]);
    env.run_ok(&["deploy"]);
    let v = env.run_err(&["plan", "resume"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn service_versions_reflects_the_latest_successful_deploy() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "dag"]);
    env.run_ok(&["deploy"]);
    let v = env.run_ok(&["service-versions"]);
    let versions = v["data"]["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    for entry in versions {
        assert_eq!(entry["version"].as_str().unwrap().len(), 7);
    }
}

#[test]
fn deployment_list_and_show_round_trip() {
    let env = TestEnv::new();
    env.init();
    env.run_ok(&["plan", "ops", "mock_install"]);
    let deployed = env.run_ok(&["deploy"]);
    let id = deployed["data"]["id"].as_i64().unwrap();

    let list = env.run_ok(&["deployment", "list"]);
    assert_eq!(list["data"]["deployments"].as_array().unwrap().len(), 1);

    let shown = env.run_ok(&["deployment", "show", &id.to_string()]);
    assert_eq!(shown["data"]["id"], id);
}

#[test]
fn deployment_show_unknown_id_is_not_found() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_err(&["deployment", "show", "999"]);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[test]
fn plan_reconfigure_reports_not_enabled() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_ok(&["plan", "reconfigure"]);
    assert_eq!(v["data"]["enabled"], false);
}

#[test]
fn empty_operations_list_is_an_error() {
    let env = TestEnv::new();
    env.init();
    let v = env.run_err(&["plan", "ops"]);
    assert_eq!(v["error"]["code"], "EMPTY_DEPLOYMENT");
}

// ─── text output (non-json) ───────────────────────────────────────

#[test]
fn text_output_init() {
    let env = TestEnv::new();
    env.cmd()
        .args(["init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized tdp at"));
}

#[test]
fn text_output_plan_show_with_nothing_planned() {
    let env = TestEnv::new();
    env.cmd().args(["init"]).assert().success();
    env.cmd()
        .args(["plan", "show"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn text_output_deploy_without_init_is_an_error() {
    let env = TestEnv::new();
    env.cmd()
        .args(["deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tdp database"));
}
