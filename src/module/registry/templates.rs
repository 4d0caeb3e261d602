//! In-process template registry
//!
//! Maps template references to factory closures. This is the instantiator used
//! when systems are compiled into the host binary.

use std::collections::HashMap;
use tracing::debug;

use crate::module::loader::{InstantiationError, Instantiator};
use crate::module::traits::{Subsystem, System};

type SystemFactory = Box<dyn Fn() -> Box<dyn System> + Send + Sync>;
type SubsystemFactory = Box<dyn Fn() -> Box<dyn Subsystem> + Send + Sync>;

/// Template registry backed by factory closures
#[derive(Default)]
pub struct TemplateRegistry {
    systems: HashMap<String, SystemFactory>,
    subsystems: HashMap<String, SubsystemFactory>,
}

impl TemplateRegistry {
    /// Create an empty template registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system factory under a template reference
    ///
    /// A later registration under the same reference replaces the earlier one.
    pub fn register_system<F, S>(&mut self, template: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: System + 'static,
    {
        self.systems.insert(
            template.into(),
            Box::new(move || -> Box<dyn System> { Box::new(factory()) }),
        );
        self
    }

    /// Register a subsystem factory under a template reference
    pub fn register_subsystem<F, S>(
        &mut self,
        template: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Subsystem + 'static,
    {
        self.subsystems.insert(
            template.into(),
            Box::new(move || -> Box<dyn Subsystem> { Box::new(factory()) }),
        );
        self
    }

    /// Whether a system template is registered
    pub fn has_system(&self, template: &str) -> bool {
        self.systems.contains_key(template)
    }

    /// Whether a subsystem template is registered
    pub fn has_subsystem(&self, template: &str) -> bool {
        self.subsystems.contains_key(template)
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("systems", &self.systems.keys().collect::<Vec<_>>())
            .field("subsystems", &self.subsystems.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Instantiator for TemplateRegistry {
    fn instantiate_system(
        &self,
        template: &str,
        environment: &str,
    ) -> Result<Box<dyn System>, InstantiationError> {
        let factory = self
            .systems
            .get(template)
            .ok_or_else(|| InstantiationError::UnknownTemplate(template.to_string()))?;
        debug!("Instantiating system template {} into {}", template, environment);
        Ok(factory())
    }

    fn instantiate_subsystem(
        &self,
        template: &str,
        environment: &str,
    ) -> Result<Box<dyn Subsystem>, InstantiationError> {
        let factory = self
            .subsystems
            .get(template)
            .ok_or_else(|| InstantiationError::UnknownTemplate(template.to_string()))?;
        debug!(
            "Instantiating subsystem template {} into {}",
            template, environment
        );
        Ok(factory())
    }
}
