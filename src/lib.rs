//! Bootstrapper - ordered bring-up of long-lived service systems
//!
//! Loads a hand-curated list of systems one at a time, in declared order,
//! inside a dedicated execution environment. Each system may be extended by
//! subsystem plugins matched to it by declared name; plugins are attached
//! before the system's own load step runs. Progress and lifecycle events are
//! published so a loading screen or log can follow along.
//!
//! ## Layout
//!
//! 1. `config` - registry and environment configuration, validation
//! 2. `module` - system/subsystem contracts, registry, instantiation, events
//! 3. `host` - execution environment switching
//! 4. `bootstrap` - the load orchestrator
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bootstrapper::{BootstrapConfig, Bootstrapper, InMemoryHost, TemplateRegistry};
//!
//! # async fn boot() -> anyhow::Result<()> {
//! let config = BootstrapConfig::from_toml_file("boot.toml".as_ref())?;
//! let templates = TemplateRegistry::new();
//! let host = Arc::new(InMemoryHost::new(config.boot_environment.clone()));
//!
//! let bootstrapper = Bootstrapper::new(config, Arc::new(templates), host)?;
//! let report = bootstrapper.start().wait().await?;
//! println!("{}/{} systems loaded", report.loaded, report.total);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod host;
pub mod module;
pub mod utils;

pub use bootstrap::{
    BootEventPublisher, BootHandle, BootPhase, BootstrapError, Bootstrapper, LoadReport,
    LoadRunState,
};
pub use config::{BootstrapConfig, ConfigError, LoggingConfig};
pub use host::{EnvironmentError, EnvironmentHost, InMemoryHost};
pub use module::{
    BootEvent, BootListener, EventManager, EventType, InstantiationError, Instantiator,
    LoadContext, LoadedSystems, ModuleError, ProgressReporter, Registry, Severity, Subsystem,
    SubsystemDescriptor, System, SystemDescriptor, SystemInstance, TemplateRegistry,
};
