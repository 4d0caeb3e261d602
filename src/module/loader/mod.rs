//! System loading support
//!
//! Handles instantiation of templates and attachment of subsystems.

pub mod instantiator;
pub mod matcher;

pub use instantiator::{InstantiationError, Instantiator};
pub use matcher::{BootPlan, MatchOutcome, PlannedSystem, SubsystemMatcher};
