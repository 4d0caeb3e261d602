//! Utility modules

pub mod logging;

pub use logging::{init_logging, init_logging_from_config, resolve_filter};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
