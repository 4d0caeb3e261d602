//! Boot event notification system
//!
//! Handles event subscriptions and delivery to observers of a boot run:
//! channel subscribers filtered by event type, and synchronous listeners.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Event types observers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Overall progress changed
    Progress,
    /// A system finished its load step
    SystemLoaded,
    /// Free-text status message
    Status,
    /// The whole run completed
    BootComplete,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Progress,
        EventType::SystemLoaded,
        EventType::Status,
        EventType::BootComplete,
    ];
}

/// Severity attached to status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A system that completed its load step
#[derive(Debug, Clone, PartialEq)]
pub struct SystemLoaded {
    /// Declared name of the system
    pub name: String,
    /// Template the system was instantiated from
    pub template: String,
    /// Position of the system's descriptor in the registry
    pub index: usize,
    /// Names of the subsystems attached before the load step ran
    pub subsystems: Vec<String>,
    /// Wall-clock time from instantiation to load completion
    pub elapsed: Duration,
}

/// Summary published once a run completes
#[derive(Debug, Clone, PartialEq)]
pub struct BootSummary {
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
}

/// Event published during a boot run
#[derive(Debug, Clone, PartialEq)]
pub enum BootEvent {
    Progress {
        /// System currently loading; `None` for run-level reports
        system: Option<String>,
        /// Overall fraction in `[0, 1]`
        fraction: f32,
    },
    SystemLoaded(SystemLoaded),
    Status {
        message: String,
        severity: Severity,
    },
    BootComplete(BootSummary),
}

impl BootEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            BootEvent::Progress { .. } => EventType::Progress,
            BootEvent::SystemLoaded(_) => EventType::SystemLoaded,
            BootEvent::Status { .. } => EventType::Status,
            BootEvent::BootComplete(_) => EventType::BootComplete,
        }
    }
}

/// Synchronous observer of boot events
///
/// Called from the bootstrapper's own task; implementations must not block.
pub trait BootListener: Send + Sync {
    fn on_progress(&self, _system: Option<&str>, _fraction: f32) {}

    fn on_system_loaded(&self, _loaded: &SystemLoaded) {}

    fn on_status(&self, _message: &str, _severity: Severity) {}

    fn on_boot_complete(&self, _summary: &BootSummary) {}
}

fn dispatch(listener: &dyn BootListener, event: &BootEvent) {
    match event {
        BootEvent::Progress { system, fraction } => {
            listener.on_progress(system.as_deref(), *fraction)
        }
        BootEvent::SystemLoaded(loaded) => listener.on_system_loaded(loaded),
        BootEvent::Status { message, severity } => listener.on_status(message, *severity),
        BootEvent::BootComplete(summary) => listener.on_boot_complete(summary),
    }
}

/// Listener that forwards boot events to tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl BootListener for LoggingListener {
    fn on_progress(&self, system: Option<&str>, fraction: f32) {
        debug!(
            "Boot progress {:.1}% ({})",
            fraction * 100.0,
            system.unwrap_or("-")
        );
    }

    fn on_system_loaded(&self, loaded: &SystemLoaded) {
        info!(
            "System {} loaded with {} subsystems",
            loaded.name,
            loaded.subsystems.len()
        );
    }

    fn on_status(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }

    fn on_boot_complete(&self, summary: &BootSummary) {
        info!(
            "Boot {} complete: {}/{} systems loaded in {:?}",
            summary.run_id, summary.loaded, summary.total, summary.elapsed
        );
    }
}

/// Event subscription manager
pub struct EventManager {
    /// Subscriber ids by event type
    subscribers: TokioMutex<HashMap<EventType, Vec<String>>>,
    /// Event channels for each subscriber (subscriber_id -> sender)
    channels: TokioMutex<HashMap<String, mpsc::UnboundedSender<BootEvent>>>,
    /// Synchronous listeners, called for every event
    listeners: TokioMutex<Vec<Arc<dyn BootListener>>>,
}

impl EventManager {
    /// Create a new event manager
    pub fn new() -> Self {
        Self {
            subscribers: TokioMutex::new(HashMap::new()),
            channels: TokioMutex::new(HashMap::new()),
            listeners: TokioMutex::new(Vec::new()),
        }
    }

    /// Subscribe to events of the given types
    ///
    /// Subscribing again under the same id replaces the previous channel and
    /// adds the new event types.
    pub async fn subscribe(
        &self,
        subscriber_id: impl Into<String>,
        event_types: Vec<EventType>,
    ) -> mpsc::UnboundedReceiver<BootEvent> {
        let subscriber_id = subscriber_id.into();
        debug!(
            "Subscriber {} subscribing to events: {:?}",
            subscriber_id, event_types
        );

        let (sender, receiver) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.lock().await;
        let mut channels = self.channels.lock().await;

        channels.insert(subscriber_id.clone(), sender);

        for event_type in event_types {
            let ids = subscribers.entry(event_type).or_insert_with(Vec::new);
            if !ids.contains(&subscriber_id) {
                ids.push(subscriber_id.clone());
            }
        }

        receiver
    }

    /// Subscribe to every event type
    pub async fn subscribe_all(
        &self,
        subscriber_id: impl Into<String>,
    ) -> mpsc::UnboundedReceiver<BootEvent> {
        self.subscribe(subscriber_id, EventType::ALL.to_vec()).await
    }

    /// Remove a subscriber and close its channel
    pub async fn unsubscribe(&self, subscriber_id: &str) {
        debug!("Subscriber {} unsubscribing from events", subscriber_id);

        let mut subscribers = self.subscribers.lock().await;
        let mut channels = self.channels.lock().await;

        channels.remove(subscriber_id);

        for ids in subscribers.values_mut() {
            ids.retain(|id| id != subscriber_id);
        }
    }

    /// Register a synchronous listener
    pub async fn add_listener(&self, listener: Arc<dyn BootListener>) {
        self.listeners.lock().await.push(listener);
    }

    /// Publish an event to listeners and subscribers of its type
    ///
    /// Never waits on a slow subscriber. Subscribers whose receiver was dropped
    /// are removed. Returns the number of channel subscribers reached.
    pub async fn publish(&self, event: BootEvent) -> usize {
        let event_type = event.event_type();

        // Listeners may publish in turn, so call them without holding the lock
        let listeners: Vec<Arc<dyn BootListener>> = self.listeners.lock().await.clone();
        for listener in &listeners {
            dispatch(listener.as_ref(), &event);
        }

        let senders: Vec<(String, mpsc::UnboundedSender<BootEvent>)> = {
            let subscribers = self.subscribers.lock().await;
            let channels = self.channels.lock().await;
            subscribers
                .get(&event_type)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| channels.get(id).map(|s| (id.clone(), s.clone())))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (subscriber_id, sender) in senders {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!("Subscriber {} went away, dropping it", subscriber_id);
                closed.push(subscriber_id);
            }
        }

        for subscriber_id in closed {
            self.unsubscribe(&subscriber_id).await;
        }

        delivered
    }

    /// Get list of subscriber ids for an event type
    pub async fn get_subscribers(&self, event_type: EventType) -> Vec<String> {
        let subscribers = self.subscribers.lock().await;
        subscribers.get(&event_type).cloned().unwrap_or_default()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager").finish_non_exhaustive()
    }
}
