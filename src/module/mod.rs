//! System module support for the bootstrapper
//!
//! ## Architecture
//!
//! - **Descriptors**: systems and subsystem plugins are listed by hand in configuration
//! - **Instantiation**: templates become typed `System`/`Subsystem` handles, checked once
//! - **Ownership**: a system instance owns the subsystems attached to it
//! - **Events**: progress and lifecycle notifications go through the `EventManager`

pub mod api;
pub mod instance;
pub mod loader;
pub mod registry;
pub mod traits;

pub use api::{BootEvent, BootListener, EventManager, EventType, Severity};
pub use instance::{LoadedSystems, SystemInstance};
pub use loader::{BootPlan, InstantiationError, Instantiator, SubsystemMatcher};
pub use registry::{Registry, SubsystemDescriptor, SystemDescriptor, TemplateRegistry};
pub use traits::{LoadContext, ModuleError, ProgressReporter, Subsystem, System};
