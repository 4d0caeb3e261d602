//! Shared fixtures for bootstrapper integration tests
//!
//! Scripted systems and subsystems append to a shared journal so tests can
//! assert on load order, attachment, and teardown.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use bootstrapper::host::EnvironmentError;
use bootstrapper::{
    BootEvent, BootstrapConfig, EnvironmentHost, InMemoryHost, LoadContext, ModuleError, Severity,
    Subsystem, SubsystemDescriptor, System, SystemDescriptor, TemplateRegistry,
};

/// Ordered record of what scripted systems did
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

/// What a scripted system does when loaded
#[derive(Clone, Default)]
pub struct Script {
    /// Inner progress values reported in order, one scheduling turn apart
    pub steps: Vec<f32>,
    pub fail_load: bool,
    pub fail_unload: bool,
}

impl Script {
    pub fn steps(steps: &[f32]) -> Self {
        Self {
            steps: steps.to_vec(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }
}

pub struct ScriptedSystem {
    name: String,
    script: Script,
    journal: Journal,
}

#[async_trait]
impl System for ScriptedSystem {
    fn name(&self) -> &str {
        &self.name
    }

    /// Journals `load:<name>:<attached subsystems>` and `env:<name>:<environment>`
    async fn load(&mut self, ctx: LoadContext<'_>) -> Result<(), ModuleError> {
        self.journal
            .push(format!("load:{}:{}", self.name, ctx.subsystems.len()));
        self.journal
            .push(format!("env:{}:{}", self.name, ctx.environment));

        for step in &self.script.steps {
            ctx.progress.report(*step);
            tokio::task::yield_now().await;
        }

        if self.script.fail_load {
            return Err(ModuleError::LoadFailed(format!("{} is scripted to fail", self.name)));
        }
        self.journal.push(format!("loaded:{}", self.name));
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), ModuleError> {
        self.journal.push(format!("unload:{}", self.name));
        if self.script.fail_unload {
            return Err(ModuleError::UnloadFailed(self.name.clone()));
        }
        Ok(())
    }
}

pub struct RecordingSubsystem {
    name: String,
    target: String,
    journal: Journal,
}

impl Subsystem for RecordingSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_system(&self) -> &str {
        &self.target
    }

    fn init(&mut self, system: &dyn System) {
        self.journal
            .push(format!("init:{}->{}", self.name, system.name()));
    }
}

/// Register a scripted system; its template is the lowercased name
pub fn add_system(templates: &mut TemplateRegistry, name: &str, script: Script, journal: &Journal) {
    let name = name.to_string();
    let journal = journal.clone();
    templates.register_system(name.to_lowercase(), move || ScriptedSystem {
        name: name.clone(),
        script: script.clone(),
        journal: journal.clone(),
    });
}

/// Register a recording subsystem under `template`
pub fn add_subsystem(
    templates: &mut TemplateRegistry,
    template: &str,
    target: &str,
    journal: &Journal,
) {
    let name = template.to_string();
    let target = target.to_string();
    let journal = journal.clone();
    templates.register_subsystem(template, move || RecordingSubsystem {
        name: name.clone(),
        target: target.clone(),
        journal: journal.clone(),
    });
}

/// Config listing `systems` by declared name (template = lowercased name)
/// and `subsystems` as (template, target system) pairs
pub fn config(systems: &[&str], subsystems: &[(&str, &str)]) -> BootstrapConfig {
    BootstrapConfig {
        systems: systems
            .iter()
            .map(|name| SystemDescriptor::new(name.to_lowercase(), *name))
            .collect(),
        subsystems: subsystems
            .iter()
            .map(|(template, system)| SubsystemDescriptor::new(*template, *system))
            .collect(),
        ..BootstrapConfig::default()
    }
}

/// Everything currently queued on a subscriber channel
pub fn drain(receiver: &mut mpsc::UnboundedReceiver<BootEvent>) -> Vec<BootEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_values(events: &[BootEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|e| match e {
            BootEvent::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        })
        .collect()
}

pub fn statuses(events: &[BootEvent], severity: Severity) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            BootEvent::Status { message, severity: s } if *s == severity => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub fn loaded_names(events: &[BootEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            BootEvent::SystemLoaded(loaded) => Some(loaded.name.clone()),
            _ => None,
        })
        .collect()
}

pub fn boot_complete_count(events: &[BootEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, BootEvent::BootComplete(_)))
        .count()
}

/// Host that refuses to prepare any environment
pub struct BrokenHost;

#[async_trait]
impl EnvironmentHost for BrokenHost {
    async fn prepare(&self, environment: &str) -> Result<(), EnvironmentError> {
        Err(EnvironmentError::PrepareFailed(
            environment.to_string(),
            "host offline".to_string(),
        ))
    }

    async fn activate(&self, environment: &str) -> Result<(), EnvironmentError> {
        Err(EnvironmentError::NotPrepared(environment.to_string()))
    }

    async fn active(&self) -> String {
        "boot".to_string()
    }
}

/// In-memory host that refuses one environment
///
/// Activating `refused` fails; preparing it also fails unless
/// `prepare_ok` is set, so both hand-off steps can be exercised.
pub struct RejectingHost {
    pub inner: InMemoryHost,
    refused: String,
    prepare_ok: bool,
}

impl RejectingHost {
    pub fn new(boot_environment: &str, refused: &str) -> Self {
        Self {
            inner: InMemoryHost::new(boot_environment),
            refused: refused.to_string(),
            prepare_ok: false,
        }
    }

    /// Refuse only the activation of the environment
    pub fn on_activate(boot_environment: &str, refused: &str) -> Self {
        Self {
            prepare_ok: true,
            ..Self::new(boot_environment, refused)
        }
    }
}

#[async_trait]
impl EnvironmentHost for RejectingHost {
    async fn prepare(&self, environment: &str) -> Result<(), EnvironmentError> {
        if environment == self.refused && !self.prepare_ok {
            return Err(EnvironmentError::PrepareFailed(
                environment.to_string(),
                "refused by host".to_string(),
            ));
        }
        self.inner.prepare(environment).await
    }

    async fn activate(&self, environment: &str) -> Result<(), EnvironmentError> {
        if environment == self.refused {
            return Err(EnvironmentError::ActivationFailed(
                environment.to_string(),
                "refused by host".to_string(),
            ));
        }
        self.inner.activate(environment).await
    }

    async fn active(&self) -> String {
        self.inner.active().await
    }
}
