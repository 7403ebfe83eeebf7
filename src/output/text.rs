use crate::models::{ComponentVersionLog, DeploymentLog, OperationLog};

pub fn print_deployment(log: &DeploymentLog) {
    println!(
        "Deployment {} [{}] state={}",
        log.id.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string()),
        log.deployment_type.as_str(),
        log.state.as_str()
    );
    if let Some(ref sources) = log.sources {
        println!("  sources: {}", sources.join(", "));
    }
    if let Some(ref targets) = log.targets {
        println!("  targets: {}", targets.join(", "));
    }
    if let Some(ref expr) = log.filter_expression {
        println!(
            "  filter: {expr} ({})",
            log.filter_type.map(|f| f.as_str()).unwrap_or("GLOB")
        );
    }
    if log.restart {
        println!("  restart: true");
    }
    println!("  operations: {}", log.operations.len());
}

pub fn print_operation_list(ops: &[OperationLog]) {
    if ops.is_empty() {
        println!("No operations.");
        return;
    }
    for op in ops {
        println!("  [{}] {}", op.state.as_str(), op.operation);
    }
}

pub fn print_component_versions(versions: &[ComponentVersionLog]) {
    if versions.is_empty() {
        println!("No component versions recorded.");
        return;
    }
    println!("{:<12} {:<20} {:<20} {:<10}", "deployment", "service", "component", "version");
    for v in versions {
        println!(
            "{:<12} {:<20} {:<20} {:<10}",
            v.deployment_id.map(|i| i.to_string()).unwrap_or_default(),
            v.service,
            v.component.as_deref().unwrap_or(""),
            v.short_version()
        );
    }
}

pub fn print_deployment_list(deployments: &[DeploymentLog]) {
    if deployments.is_empty() {
        println!("No deployments found.");
        return;
    }
    for d in deployments {
        println!(
            "  {} [{}] {} ops={}",
            d.id.map(|i| i.to_string()).unwrap_or_default(),
            d.deployment_type.as_str(),
            d.state.as_str(),
            d.operations.len()
        );
    }
}
