//! Live system instances
//!
//! A [`SystemInstance`] owns its system together with every subsystem attached
//! to it; dropping the instance tears the whole group down.

use tracing::{info, warn};

use crate::module::traits::{ModuleError, Subsystem, System};

/// A system and the subsystems attached to it
pub struct SystemInstance {
    name: String,
    template: String,
    environment: String,
    pub(crate) system: Box<dyn System>,
    pub(crate) subsystems: Vec<Box<dyn Subsystem>>,
}

impl SystemInstance {
    /// Wrap a freshly instantiated system under its declared name
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        environment: impl Into<String>,
        system: Box<dyn System>,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            environment: environment.into(),
            system,
            subsystems: Vec::new(),
        }
    }

    /// Declared name, as given by the system descriptor
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template the system was instantiated from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Environment the system lives in
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn system(&self) -> &dyn System {
        self.system.as_ref()
    }

    pub fn system_mut(&mut self) -> &mut dyn System {
        self.system.as_mut()
    }

    /// Attached subsystems, in attachment order
    pub fn subsystems(&self) -> &[Box<dyn Subsystem>] {
        &self.subsystems
    }

    /// Names the attached subsystems report for themselves
    pub fn subsystem_names(&self) -> Vec<String> {
        self.subsystems.iter().map(|s| s.name().to_string()).collect()
    }

    /// Attach a subsystem and run its init hook against the owning system
    pub fn attach(&mut self, mut subsystem: Box<dyn Subsystem>) {
        subsystem.init(self.system.as_ref());
        self.subsystems.push(subsystem);
    }

    /// Unload the system; subsystems are released with the instance
    pub async fn unload(mut self) -> Result<(), ModuleError> {
        self.system.unload().await
    }
}

impl std::fmt::Debug for SystemInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemInstance")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("environment", &self.environment)
            .field("subsystems", &self.subsystem_names())
            .finish()
    }
}

/// Systems that completed their load step, in load order
#[derive(Debug, Default)]
pub struct LoadedSystems {
    instances: Vec<SystemInstance>,
}

impl LoadedSystems {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, instance: SystemInstance) {
        self.instances.push(instance);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Look up a loaded system by declared name
    pub fn get(&self, name: &str) -> Option<&SystemInstance> {
        self.instances.iter().find(|i| i.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SystemInstance> {
        self.instances.iter_mut().find(|i| i.name() == name)
    }

    /// Declared names in load order
    pub fn names(&self) -> Vec<&str> {
        self.instances.iter().map(|i| i.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemInstance> {
        self.instances.iter()
    }

    /// Unload every system in reverse load order
    ///
    /// A failing unload is logged and does not stop the remaining ones.
    /// Returns the names of systems whose unload failed.
    pub async fn unload_all(self) -> Vec<String> {
        info!("Unloading {} systems", self.instances.len());

        let mut failed = Vec::new();
        for instance in self.instances.into_iter().rev() {
            let name = instance.name().to_string();
            match instance.unload().await {
                Ok(()) => info!("System {} unloaded", name),
                Err(e) => {
                    warn!("Error unloading system {}: {}", name, e);
                    failed.push(name);
                }
            }
        }
        failed
    }
}
