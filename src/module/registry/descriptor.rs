//! System and subsystem descriptors
//!
//! Descriptors are hand-curated in configuration; they name a template to
//! instantiate and the addressing key used for subsystem matching.

use serde::{Deserialize, Serialize};

use crate::config::BootstrapConfig;

/// Describes one system to bring up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDescriptor {
    /// Template the instantiator builds the system from
    pub template: String,
    /// Declared name; the key subsystems use to address this system
    pub name: String,
}

impl SystemDescriptor {
    pub fn new(template: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            name: name.into(),
        }
    }
}

/// Describes one subsystem plugin and the system it extends
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubsystemDescriptor {
    /// Template the instantiator builds the subsystem from
    pub template: String,
    /// Declared name of the target system (exact, case-sensitive match)
    pub system: String,
}

impl SubsystemDescriptor {
    pub fn new(template: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            system: system.into(),
        }
    }

    /// Whether this subsystem targets the system with the given declared name
    pub fn targets(&self, system_name: &str) -> bool {
        self.system == system_name
    }
}

/// Ordered systems plus unordered subsystems, fixed for the duration of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    systems: Vec<SystemDescriptor>,
    subsystems: Vec<SubsystemDescriptor>,
}

impl Registry {
    pub fn new(systems: Vec<SystemDescriptor>, subsystems: Vec<SubsystemDescriptor>) -> Self {
        Self {
            systems,
            subsystems,
        }
    }

    /// Build a registry from the descriptor lists in configuration
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(config.systems.clone(), config.subsystems.clone())
    }

    /// Systems in load order
    pub fn systems(&self) -> &[SystemDescriptor] {
        &self.systems
    }

    /// All subsystem descriptors
    pub fn subsystems(&self) -> &[SubsystemDescriptor] {
        &self.subsystems
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Subsystem descriptors targeting the given system
    pub fn subsystems_for<'a>(
        &'a self,
        system_name: &'a str,
    ) -> impl Iterator<Item = &'a SubsystemDescriptor> + 'a {
        self.subsystems.iter().filter(move |s| s.targets(system_name))
    }

    /// Subsystem descriptors no system in this registry will pick up
    pub fn unmatched_subsystems(&self) -> Vec<&SubsystemDescriptor> {
        self.subsystems
            .iter()
            .filter(|s| !self.systems.iter().any(|d| s.targets(&d.name)))
            .collect()
    }
}
