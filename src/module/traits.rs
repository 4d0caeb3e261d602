//! System and subsystem traits
//!
//! Defines the contracts a system module and its subsystem plugins implement,
//! plus the context handed to a system while it loads.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// A long-lived service brought up by the bootstrapper.
///
/// Implementations are produced by an [`Instantiator`](crate::module::loader::Instantiator)
/// and loaded one at a time, in registry order.
#[async_trait]
pub trait System: Send + Sync {
    /// Name the system reports for itself
    fn name(&self) -> &str;

    /// Load the system
    ///
    /// May suspend for as long as the system needs. Progress in `[0, 1]` can be
    /// reported through `ctx.progress` any number of times before returning.
    /// Subsystems targeting this system are already attached and visible in
    /// `ctx.subsystems`.
    async fn load(&mut self, ctx: LoadContext<'_>) -> Result<(), ModuleError>;

    /// Unload the system
    ///
    /// Systems without teardown work keep the default no-op.
    async fn unload(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// A plugin that extends exactly one system, matched by the system's declared name.
pub trait Subsystem: Send + Sync {
    /// Name the subsystem reports for itself
    fn name(&self) -> &str;

    /// Declared name of the system this subsystem extends
    fn target_system(&self) -> &str;

    /// Called once, right after the subsystem is attached to its owning system
    fn init(&mut self, _system: &dyn System) {}
}

/// Context provided to a system for the duration of its load step
pub struct LoadContext<'a> {
    /// Environment the system was instantiated into
    pub environment: &'a str,
    /// Subsystems attached to the system being loaded
    pub subsystems: &'a [Box<dyn Subsystem>],
    /// Progress sink for the system's own internal progress
    pub progress: ProgressReporter,
}

impl<'a> LoadContext<'a> {
    /// Create a new load context
    pub fn new(
        environment: &'a str,
        subsystems: &'a [Box<dyn Subsystem>],
        progress: ProgressReporter,
    ) -> Self {
        Self {
            environment,
            subsystems,
            progress,
        }
    }

    /// Find an attached subsystem by its reported name
    pub fn subsystem(&self, name: &str) -> Option<&dyn Subsystem> {
        self.subsystems
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }
}

/// Handle a loading system uses to report its internal progress.
///
/// Values are carried back to the bootstrapper by message; the system never
/// touches run state directly.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: mpsc::UnboundedSender<f32>,
}

impl ProgressReporter {
    /// Create a reporter paired with the receiver the bootstrapper reads from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<f32>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Report internal progress in `[0, 1]`
    ///
    /// Reports sent after the run stopped listening are dropped.
    pub fn report(&self, fraction: f32) {
        let _ = self.sender.send(fraction);
    }
}

/// Errors raised by systems during load or unload
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("System load failed: {0}")]
    LoadFailed(String),

    #[error("System unload failed: {0}")]
    UnloadFailed(String),

    #[error("System operation failed: {0}")]
    OperationError(String),
}

impl From<anyhow::Error> for ModuleError {
    fn from(e: anyhow::Error) -> Self {
        ModuleError::OperationError(e.to_string())
    }
}
