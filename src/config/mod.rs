//! Configuration management for the bootstrapper
//!
//! Handles configuration loading and validation of the system registry and
//! environment identifiers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::module::registry::{SubsystemDescriptor, SystemDescriptor};

/// Bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Environment the bootstrapper runs in and returns to when done
    #[serde(default = "default_boot_environment")]
    pub boot_environment: String,

    /// Environment systems are instantiated into
    #[serde(default = "default_system_environment")]
    pub system_environment: String,

    /// Environment to hand over to once boot completes (none = stay in boot)
    #[serde(default)]
    pub post_boot_environment: Option<String>,

    /// Systems to bring up, in load order
    #[serde(default)]
    pub systems: Vec<SystemDescriptor>,

    /// Subsystem plugins, matched to systems by declared name
    #[serde(default)]
    pub subsystems: Vec<SubsystemDescriptor>,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_boot_environment() -> String {
    "boot".to_string()
}

fn default_system_environment() -> String {
    "systems".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            boot_environment: default_boot_environment(),
            system_environment: default_system_environment(),
            post_boot_environment: None,
            systems: Vec::new(),
            subsystems: Vec::new(),
            logging: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "bootstrapper=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,
}

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("System at position {0} has an empty name")]
    EmptySystemName(usize),

    #[error("System {0} has an empty template")]
    EmptyTemplate(String),

    #[error("Subsystem at position {0} has an empty template")]
    EmptySubsystemTemplate(usize),

    #[error("System name {0} is declared more than once")]
    DuplicateSystemName(String),

    #[error("Boot and system environments must differ (both are {0})")]
    SharedEnvironment(String),
}

impl BootstrapConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: BootstrapConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BootstrapConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.boot_environment == self.system_environment {
            return Err(ConfigError::SharedEnvironment(
                self.boot_environment.clone(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, system) in self.systems.iter().enumerate() {
            if system.name.is_empty() {
                return Err(ConfigError::EmptySystemName(index));
            }
            if system.template.is_empty() {
                return Err(ConfigError::EmptyTemplate(system.name.clone()));
            }
            // A duplicate would attach the same subsystems to two systems
            if !seen.insert(system.name.as_str()) {
                return Err(ConfigError::DuplicateSystemName(system.name.clone()));
            }
        }

        for (index, subsystem) in self.subsystems.iter().enumerate() {
            if subsystem.template.is_empty() {
                return Err(ConfigError::EmptySubsystemTemplate(index));
            }
        }

        Ok(())
    }
}
