//! Load orchestrator
//!
//! Brings the configured systems up one at a time inside a dedicated system
//! environment, attaches subsystems before each load, and reports progress
//! and completion through the event manager.
//!
//! A run moves through [`BootPhase`]s in order:
//! `Idle → EnvironmentPreparing → EnvironmentReady → LoadingSystem(i)… →
//! EnvironmentRestoring → Complete`. Only environment host failures before
//! `Complete` abort a run; every per-system failure is reported and skipped,
//! and a failed post-boot hand-off is reported in the [`LoadReport`].

pub mod progress;
pub mod publisher;

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{watch, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{BootstrapConfig, ConfigError};
use crate::host::{EnvironmentError, EnvironmentHost};
use crate::module::api::events::{BootSummary, EventManager, Severity, SystemLoaded};
use crate::module::instance::{LoadedSystems, SystemInstance};
use crate::module::loader::{Instantiator, SubsystemMatcher};
use crate::module::registry::{Registry, SystemDescriptor};
use crate::module::traits::{LoadContext, ProgressReporter};

pub use progress::{overall_fraction, LoadRunState};
pub use publisher::BootEventPublisher;

/// Where a run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootPhase {
    Idle,
    EnvironmentPreparing,
    EnvironmentReady,
    LoadingSystem { index: usize, name: String },
    EnvironmentRestoring,
    Complete,
}

/// Errors that stop a bootstrapper from being built or a run from finishing
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment host error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Boot task failed: {0}")]
    Join(String),
}

/// Result of a completed run
#[derive(Debug)]
pub struct LoadReport {
    pub run_id: Uuid,
    /// Systems in the registry
    pub total: usize,
    /// Systems that completed their load step
    pub loaded: usize,
    /// Declared names of systems whose template did not instantiate
    pub skipped: Vec<String>,
    /// Declared names of systems whose load step returned an error
    pub failed: Vec<String>,
    pub elapsed: Duration,
    /// Live systems, in load order
    pub systems: LoadedSystems,
    /// Why the post-boot environment hand-off failed, if it did
    pub post_boot_error: Option<String>,
}

enum SystemOutcome {
    Loaded(SystemInstance),
    Skipped,
    Failed,
}

/// Ordered system bootstrapper
pub struct Bootstrapper {
    config: BootstrapConfig,
    registry: Registry,
    instantiator: Arc<dyn Instantiator>,
    host: Arc<dyn EnvironmentHost>,
    publisher: BootEventPublisher,
    phase: watch::Sender<BootPhase>,
    /// Runs never overlap
    run_lock: TokioMutex<()>,
}

impl Bootstrapper {
    /// Create a bootstrapper over a validated configuration
    pub fn new(
        config: BootstrapConfig,
        instantiator: Arc<dyn Instantiator>,
        host: Arc<dyn EnvironmentHost>,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;

        let registry = Registry::from_config(&config);
        info!(
            "Bootstrapper configured with {} systems and {} subsystems",
            registry.systems().len(),
            registry.subsystems().len()
        );
        for inert in registry.unmatched_subsystems() {
            debug!(
                "Subsystem {} targets unknown system {}, it will not attach",
                inert.template, inert.system
            );
        }

        let (phase, _) = watch::channel(BootPhase::Idle);

        Ok(Self {
            config,
            registry,
            instantiator,
            host,
            publisher: BootEventPublisher::new(Arc::new(EventManager::new())),
            phase,
            run_lock: TokioMutex::new(()),
        })
    }

    /// Publish through a caller-provided event manager
    pub fn with_event_manager(mut self, event_manager: Arc<EventManager>) -> Self {
        self.publisher = BootEventPublisher::new(event_manager);
        self
    }

    pub fn event_manager(&self) -> Arc<EventManager> {
        Arc::clone(self.publisher.event_manager())
    }

    /// Watch the current phase
    pub fn phase(&self) -> watch::Receiver<BootPhase> {
        self.phase.subscribe()
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Spawn a run on the tokio runtime
    pub fn start(self) -> BootHandle {
        let phase = self.phase();
        let event_manager = self.event_manager();
        let task = tokio::spawn(async move { self.run().await });

        BootHandle {
            task,
            phase,
            event_manager,
        }
    }

    /// Perform one run
    pub async fn run(&self) -> Result<LoadReport, BootstrapError> {
        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        let span = info_span!("boot", run_id = %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<LoadReport, BootstrapError> {
        let started = Instant::now();
        let total = self.registry.len();
        let mut state = LoadRunState::new(total);
        let mut systems = LoadedSystems::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        info!("Starting boot run {} with {} systems", run_id, total);
        self.publisher
            .publish_status("Starting to load systems...", Severity::Info)
            .await;

        if total > 0 {
            let system_environment = self.config.system_environment.as_str();

            self.set_phase(BootPhase::EnvironmentPreparing);
            self.host.prepare(system_environment).await?;

            self.set_phase(BootPhase::EnvironmentReady);
            self.host.activate(system_environment).await?;
            self.publisher
                .publish_status(
                    format!(
                        "System container environment '{}' created and set active.",
                        system_environment
                    ),
                    Severity::Info,
                )
                .await;

            for (index, descriptor) in self.registry.systems().iter().enumerate() {
                self.set_phase(BootPhase::LoadingSystem {
                    index,
                    name: descriptor.name.clone(),
                });

                match self.load_system(index, descriptor, &mut state).await {
                    SystemOutcome::Loaded(instance) => systems.push(instance),
                    SystemOutcome::Skipped => skipped.push(descriptor.name.clone()),
                    SystemOutcome::Failed => failed.push(descriptor.name.clone()),
                }
            }

            self.set_phase(BootPhase::EnvironmentRestoring);
            if let Err(e) = self.host.activate(&self.config.boot_environment).await {
                warn!("Boot environment could not be restored, unloading systems: {}", e);
                systems.unload_all().await;
                return Err(e.into());
            }
            tokio::task::yield_now().await;
        }

        self.set_phase(BootPhase::Complete);
        if let Some(fraction) = state.finish() {
            self.publisher.publish_progress(None, fraction).await;
        }

        let elapsed = started.elapsed();
        let summary = BootSummary {
            run_id,
            total,
            loaded: state.loaded(),
            skipped: skipped.clone(),
            failed: failed.clone(),
            elapsed,
        };
        self.publisher.publish_boot_complete(summary).await;
        self.publisher
            .publish_status("Finished loading all the systems.", Severity::Info)
            .await;

        let mut post_boot_error = None;
        if let Some(post_boot) = &self.config.post_boot_environment {
            match self.hand_off(post_boot).await {
                Ok(()) => {
                    self.publisher
                        .publish_status(
                            format!("Switched to post-boot environment '{}'.", post_boot),
                            Severity::Info,
                        )
                        .await;
                }
                Err(e) => {
                    self.publisher
                        .publish_status(
                            format!("Could not switch to post-boot environment: {}", e),
                            Severity::Error,
                        )
                        .await;
                    post_boot_error = Some(e.to_string());
                }
            }
        }

        info!(
            "Boot run {} finished: {}/{} systems loaded in {:?}",
            run_id,
            state.loaded(),
            total,
            elapsed
        );

        Ok(LoadReport {
            run_id,
            total,
            loaded: state.loaded(),
            skipped,
            failed,
            elapsed,
            systems,
            post_boot_error,
        })
    }

    /// Prepare and activate the post-boot environment
    async fn hand_off(&self, environment: &str) -> Result<(), EnvironmentError> {
        self.host.prepare(environment).await?;
        self.host.activate(environment).await
    }

    async fn load_system(
        &self,
        index: usize,
        descriptor: &SystemDescriptor,
        state: &mut LoadRunState,
    ) -> SystemOutcome {
        let started = Instant::now();
        let environment = self.config.system_environment.as_str();
        let name = descriptor.name.as_str();

        let system = match self
            .instantiator
            .instantiate_system(&descriptor.template, environment)
        {
            Ok(system) => system,
            Err(e) => {
                self.publisher
                    .publish_status(
                        format!(
                            "Skipping system {} (template {}): {}",
                            name, descriptor.template, e
                        ),
                        Severity::Warning,
                    )
                    .await;
                return SystemOutcome::Skipped;
            }
        };

        let mut instance =
            SystemInstance::new(name, descriptor.template.as_str(), environment, system);
        let matched = SubsystemMatcher::attach(
            &mut instance,
            self.registry.subsystems(),
            self.instantiator.as_ref(),
        );
        for (subsystem, e) in matched.failed {
            self.publisher
                .publish_status(
                    format!(
                        "Skipping subsystem {} for system {}: {}",
                        subsystem.template, name, e
                    ),
                    Severity::Warning,
                )
                .await;
        }

        info!("Loading system: {}", name);
        state.begin(name);
        let (reporter, mut progress) = ProgressReporter::channel();

        let result = {
            let ctx = LoadContext::new(environment, &instance.subsystems, reporter);
            let mut load = instance.system.load(ctx);
            loop {
                tokio::select! {
                    biased;
                    Some(inner) = progress.recv() => {
                        self.report_progress(state, name, inner).await;
                    }
                    result = &mut load => break result,
                }
            }
        };
        while let Ok(inner) = progress.try_recv() {
            self.report_progress(state, name, inner).await;
        }

        match result {
            Ok(()) => {
                if let Some(fraction) = state.complete() {
                    self.publisher.publish_progress(Some(name), fraction).await;
                }

                let elapsed = started.elapsed();
                self.publisher
                    .publish_system_loaded(SystemLoaded {
                        name: name.to_string(),
                        template: descriptor.template.clone(),
                        index,
                        subsystems: instance.subsystem_names(),
                        elapsed,
                    })
                    .await;
                self.publisher
                    .publish_status(
                        format!(
                            "{} finished loading in {} milliseconds.",
                            name,
                            elapsed.as_millis()
                        ),
                        Severity::Info,
                    )
                    .await;
                SystemOutcome::Loaded(instance)
            }
            Err(e) => {
                state.abandon();
                self.publisher
                    .publish_status(
                        format!("System {} failed to load: {}", name, e),
                        Severity::Error,
                    )
                    .await;
                SystemOutcome::Failed
            }
        }
    }

    async fn report_progress(&self, state: &mut LoadRunState, name: &str, inner: f32) {
        if let Some(fraction) = state.record(inner) {
            self.publisher.publish_progress(Some(name), fraction).await;
        }
    }

    fn set_phase(&self, phase: BootPhase) {
        debug!("Boot phase: {:?}", phase);
        self.phase.send_replace(phase);
    }
}

/// Handle to a run spawned with [`Bootstrapper::start`]
#[derive(Debug)]
pub struct BootHandle {
    task: JoinHandle<Result<LoadReport, BootstrapError>>,
    phase: watch::Receiver<BootPhase>,
    event_manager: Arc<EventManager>,
}

impl BootHandle {
    /// Watch the run's phase
    pub fn phase(&self) -> watch::Receiver<BootPhase> {
        self.phase.clone()
    }

    pub fn event_manager(&self) -> Arc<EventManager> {
        Arc::clone(&self.event_manager)
    }

    /// Whether the run has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to finish
    pub async fn wait(self) -> Result<LoadReport, BootstrapError> {
        self.task
            .await
            .map_err(|e| BootstrapError::Join(e.to_string()))?
    }
}
