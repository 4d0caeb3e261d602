//! Logging initialization
//!
//! Every entry point:
//! - respects the RUST_LOG environment variable, which always wins
//! - falls back to the filter from config, then to "info"
//! - installs a global subscriber at most once; later calls are no-ops
//!
//! # Usage
//! ```rust
//! use bootstrapper::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "info";

/// Resolve the effective filter directive
///
/// RUST_LOG takes precedence over `filter`, which takes precedence over the
/// "info" default.
pub fn resolve_filter(env: Option<&str>, filter: Option<&str>) -> String {
    env.or(filter).unwrap_or(DEFAULT_FILTER).to_string()
}

fn env_filter(filter: Option<&str>) -> EnvFilter {
    let env = std::env::var("RUST_LOG").ok();
    EnvFilter::new(resolve_filter(env.as_deref(), filter))
}

/// Initialize human-readable logging
///
/// Returns `false` if a global subscriber was already installed.
///
/// # Example
/// ```rust
/// use bootstrapper::utils::init_logging;
///
/// // Override with config filter (RUST_LOG still takes precedence)
/// init_logging(Some("bootstrapper=debug"));
/// ```
pub fn init_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(env_filter(filter))
        .try_init()
        .is_ok()
}

/// Initialize logging with JSON output, including the run span
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(env_filter(filter))
        .try_init()
        .is_ok()
}

/// Initialize logging from the `[logging]` section of a [`BootstrapConfig`](crate::config::BootstrapConfig)
///
/// `json_format` without the `json-logging` feature falls back to
/// human-readable output.
pub fn init_logging_from_config(config: Option<&LoggingConfig>) -> bool {
    let filter = config.and_then(|c| c.filter.as_deref());

    if config.map(|c| c.json_format).unwrap_or(false) {
        #[cfg(feature = "json-logging")]
        {
            return init_json_logging(filter);
        }
        #[cfg(not(feature = "json-logging"))]
        {
            tracing::debug!("json-logging feature disabled, using plain output");
        }
    }
    init_logging(filter)
}
