//! Instantiation contract
//!
//! The host decides how a template becomes a live system or subsystem. The
//! bootstrapper only needs a typed handle back, or a reason it could not get one.

use thiserror::Error;

use crate::module::traits::{Subsystem, System};

/// Produces live systems and subsystems from template references.
///
/// Instantiation is synchronous: it returns before the bootstrapper moves on,
/// even though the returned system loads asynchronously.
pub trait Instantiator: Send + Sync {
    /// Instantiate a system template into the given environment
    fn instantiate_system(
        &self,
        template: &str,
        environment: &str,
    ) -> Result<Box<dyn System>, InstantiationError>;

    /// Instantiate a subsystem template into the given environment
    fn instantiate_subsystem(
        &self,
        template: &str,
        environment: &str,
    ) -> Result<Box<dyn Subsystem>, InstantiationError>;
}

/// Reasons a template does not yield a usable instance
#[derive(Debug, Error)]
pub enum InstantiationError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template {template} rejected: {reason}")]
    Rejected { template: String, reason: String },

    #[error("Subsystem {template} targets {actual}, not {expected}")]
    WrongTarget {
        template: String,
        expected: String,
        actual: String,
    },
}

impl InstantiationError {
    /// Template reference the failure is about
    pub fn template(&self) -> &str {
        match self {
            InstantiationError::UnknownTemplate(template) => template,
            InstantiationError::Rejected { template, .. } => template,
            InstantiationError::WrongTarget { template, .. } => template,
        }
    }
}
