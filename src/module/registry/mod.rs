//! System registry
//!
//! Handles the hand-curated descriptor lists and in-process template lookup.

pub mod descriptor;
pub mod templates;

pub use descriptor::{Registry, SubsystemDescriptor, SystemDescriptor};
pub use templates::TemplateRegistry;
