//! Boot event API
//!
//! Provides the event surface observers use to follow a boot run.

pub mod events;

pub use events::{
    BootEvent, BootListener, BootSummary, EventManager, EventType, LoggingListener, Severity,
    SystemLoaded,
};
