//! Inspect a bootstrapper configuration
//!
//! Prints the ordered load plan with the subsystems each system would pick up,
//! and any subsystem descriptors that target no configured system.
//!
//! Usage:
//!   boot-plan --config <file> [--dry-run] [--json] [--log <filter>]

use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use bootstrapper::module::api::{BootSummary, LoggingListener, SystemLoaded};
use bootstrapper::module::BootPlan;
use bootstrapper::utils::{init_logging, init_logging_from_config};
use bootstrapper::{
    BootListener, BootstrapConfig, Bootstrapper, InMemoryHost, LoadContext, ModuleError,
    Registry, Severity, Subsystem, System, TemplateRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "boot-plan", about = "Show what a bootstrapper configuration would load")]
struct Args {
    /// Configuration file (TOML, or JSON with a .json extension)
    #[arg(long)]
    config: PathBuf,

    /// Run the boot against an in-memory host with no-op systems
    #[arg(long)]
    dry_run: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Log filter, overrides the config file (RUST_LOG still wins)
    #[arg(long)]
    log: Option<String>,
}

struct NoopSystem {
    name: String,
}

#[async_trait]
impl System for NoopSystem {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&mut self, ctx: LoadContext<'_>) -> Result<(), ModuleError> {
        ctx.progress.report(1.0);
        Ok(())
    }
}

struct NoopSubsystem {
    name: String,
    target: String,
}

impl Subsystem for NoopSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_system(&self) -> &str {
        &self.target
    }
}

/// Echoes events to stdout
struct PrintListener;

impl BootListener for PrintListener {
    fn on_progress(&self, system: Option<&str>, fraction: f32) {
        println!("  [{:>5.1}%] {}", fraction * 100.0, system.unwrap_or("-"));
    }

    fn on_system_loaded(&self, loaded: &SystemLoaded) {
        println!(
            "  loaded #{} {} ({}) subsystems: {:?}",
            loaded.index, loaded.name, loaded.template, loaded.subsystems
        );
    }

    fn on_status(&self, message: &str, severity: Severity) {
        println!("  {:?}: {}", severity, message);
    }

    fn on_boot_complete(&self, summary: &BootSummary) {
        println!(
            "  complete: {}/{} loaded, skipped {:?}, failed {:?}",
            summary.loaded, summary.total, summary.skipped, summary.failed
        );
    }
}

fn print_plan(plan: &BootPlan) {
    println!("Load order:");
    for (index, system) in plan.systems.iter().enumerate() {
        println!("  {}. {} (template {})", index + 1, system.name, system.template);
        for subsystem in &system.subsystems {
            println!("       + {}", subsystem);
        }
    }
    if !plan.inert.is_empty() {
        println!("Inert subsystems:");
        for descriptor in &plan.inert {
            println!(
                "  {} -> {} (no such system)",
                descriptor.template, descriptor.system
            );
        }
    }
}

/// Dry-run copy of `config` with one no-op factory per descriptor
///
/// Descriptors may share a template, so each system is re-keyed on its
/// declared name and each subsystem on `<template>-><system>`. Factories then
/// produce instances carrying the right name and target.
fn noop_templates(config: &BootstrapConfig) -> (BootstrapConfig, TemplateRegistry) {
    let mut dry_run = config.clone();
    let mut templates = TemplateRegistry::new();

    for descriptor in &mut dry_run.systems {
        let name = descriptor.name.clone();
        descriptor.template = name.clone();
        templates.register_system(name.clone(), move || NoopSystem { name: name.clone() });
    }
    for descriptor in &mut dry_run.subsystems {
        let name = descriptor.template.clone();
        let target = descriptor.system.clone();
        descriptor.template = format!("{}->{}", name, target);
        templates.register_subsystem(descriptor.template.clone(), move || NoopSubsystem {
            name: name.clone(),
            target: target.clone(),
        });
    }
    (dry_run, templates)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = BootstrapConfig::from_file(&args.config)?;
    match args.log.as_deref() {
        Some(filter) => init_logging(Some(filter)),
        None => init_logging_from_config(config.logging.as_ref()),
    };
    config.validate()?;

    info!("Loaded configuration from {:?}", args.config);

    let plan = BootPlan::from_registry(&Registry::from_config(&config));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    if args.dry_run {
        let (config, templates) = noop_templates(&config);
        let host = Arc::new(InMemoryHost::new(config.boot_environment.clone()));
        let bootstrapper = Bootstrapper::new(config, Arc::new(templates), host)?;

        // no plain-text event lines next to the JSON plan, events go to the log
        let listener: Arc<dyn BootListener> = if args.json {
            Arc::new(LoggingListener)
        } else {
            println!("Dry run:");
            Arc::new(PrintListener)
        };
        bootstrapper.event_manager().add_listener(listener).await;

        let report = bootstrapper.start().wait().await?;
        info!(
            "Dry run {} finished in {:?}",
            report.run_id, report.elapsed
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrapper::{Instantiator, SubsystemDescriptor, SystemDescriptor};

    #[test]
    fn test_shared_templates_keep_descriptor_identity() {
        let config = BootstrapConfig {
            systems: vec![
                SystemDescriptor::new("worker", "Ingest"),
                SystemDescriptor::new("worker", "Export"),
            ],
            subsystems: vec![
                SubsystemDescriptor::new("metrics", "Ingest"),
                SubsystemDescriptor::new("metrics", "Export"),
            ],
            ..BootstrapConfig::default()
        };

        let (dry_run, templates) = noop_templates(&config);

        let names: Vec<String> = dry_run
            .systems
            .iter()
            .map(|d| {
                templates
                    .instantiate_system(&d.template, "systems")
                    .unwrap()
                    .name()
                    .to_string()
            })
            .collect();
        assert_eq!(names, vec!["Ingest", "Export"]);

        let targets: Vec<(String, String)> = dry_run
            .subsystems
            .iter()
            .map(|d| {
                let subsystem = templates
                    .instantiate_subsystem(&d.template, "systems")
                    .unwrap();
                (subsystem.name().to_string(), subsystem.target_system().to_string())
            })
            .collect();
        assert_eq!(
            targets,
            vec![
                ("metrics".to_string(), "Ingest".to_string()),
                ("metrics".to_string(), "Export".to_string()),
            ]
        );
        assert_eq!(dry_run.subsystems[1].system, "Export");
    }

    #[tokio::test]
    async fn test_dry_run_attaches_every_matched_subsystem() {
        let config = BootstrapConfig {
            systems: vec![
                SystemDescriptor::new("worker", "Ingest"),
                SystemDescriptor::new("worker", "Export"),
            ],
            subsystems: vec![
                SubsystemDescriptor::new("metrics", "Ingest"),
                SubsystemDescriptor::new("metrics", "Export"),
            ],
            ..BootstrapConfig::default()
        };

        let (config, templates) = noop_templates(&config);
        let host = Arc::new(InMemoryHost::new(config.boot_environment.clone()));
        let bootstrapper = Bootstrapper::new(config, Arc::new(templates), host).unwrap();

        let report = bootstrapper.run().await.unwrap();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.systems.names(), vec!["Ingest", "Export"]);
        for name in ["Ingest", "Export"] {
            let instance = report.systems.get(name).unwrap();
            assert_eq!(instance.subsystem_names(), vec!["metrics".to_string()]);
        }
    }
}
