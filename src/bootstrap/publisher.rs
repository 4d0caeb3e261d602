//! Event publisher for boot runs
//!
//! Bridges orchestrator state changes to the boot event system.

use std::sync::Arc;
use tracing::debug;

use crate::module::api::events::{BootEvent, BootSummary, EventManager, Severity, SystemLoaded};

/// Publishes run events through an [`EventManager`]
#[derive(Debug, Clone)]
pub struct BootEventPublisher {
    event_manager: Arc<EventManager>,
}

impl BootEventPublisher {
    /// Create a new event publisher
    pub fn new(event_manager: Arc<EventManager>) -> Self {
        Self { event_manager }
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.event_manager
    }

    /// Publish overall progress
    pub async fn publish_progress(&self, system: Option<&str>, fraction: f32) {
        let event = BootEvent::Progress {
            system: system.map(str::to_string),
            fraction,
        };
        self.event_manager.publish(event).await;
    }

    /// Publish a status message
    pub async fn publish_status(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        debug!("Publishing {:?} status: {}", severity, message);

        let event = BootEvent::Status { message, severity };
        self.event_manager.publish(event).await;
    }

    /// Publish per-system completion
    pub async fn publish_system_loaded(&self, loaded: SystemLoaded) {
        debug!("Publishing SystemLoaded event for {}", loaded.name);
        self.event_manager
            .publish(BootEvent::SystemLoaded(loaded))
            .await;
    }

    /// Publish run completion
    pub async fn publish_boot_complete(&self, summary: BootSummary) {
        debug!("Publishing BootComplete event for run {}", summary.run_id);
        let reached = self
            .event_manager
            .publish(BootEvent::BootComplete(summary))
            .await;
        debug!("BootComplete delivered to {} subscribers", reached);
    }
}
