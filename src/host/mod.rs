//! Execution environment host
//!
//! The host owns the execution environments systems are instantiated into.
//! The bootstrapper only asks it to prepare an environment, to make one
//! active, and which one is active.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Host-side environment switching
#[async_trait]
pub trait EnvironmentHost: Send + Sync {
    /// Create or load an environment; returns once the host reports it ready
    async fn prepare(&self, environment: &str) -> Result<(), EnvironmentError>;

    /// Make a prepared environment the active target
    async fn activate(&self, environment: &str) -> Result<(), EnvironmentError>;

    /// Currently active environment
    async fn active(&self) -> String;
}

/// Environment host failures
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Environment {0} could not be prepared: {1}")]
    PrepareFailed(String, String),

    #[error("Environment {0} is not prepared")]
    NotPrepared(String),

    #[error("Environment {0} could not be activated: {1}")]
    ActivationFailed(String, String),
}

#[derive(Debug)]
struct HostState {
    prepared: HashSet<String>,
    active: String,
    transitions: Vec<Transition>,
}

/// A recorded host operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Prepared(String),
    Activated(String),
}

/// Bookkeeping host for in-process runs and tests
///
/// Environments are names only; preparing one yields a scheduling turn to
/// stand in for asynchronous creation.
#[derive(Debug)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    /// Create a host whose active environment is `boot_environment`
    pub fn new(boot_environment: impl Into<String>) -> Self {
        let boot_environment = boot_environment.into();
        let mut prepared = HashSet::new();
        prepared.insert(boot_environment.clone());
        Self {
            state: Mutex::new(HostState {
                prepared,
                active: boot_environment,
                transitions: Vec::new(),
            }),
        }
    }

    /// Every prepare/activate call, in order
    pub async fn transitions(&self) -> Vec<Transition> {
        self.state.lock().await.transitions.clone()
    }

    pub async fn is_prepared(&self, environment: &str) -> bool {
        self.state.lock().await.prepared.contains(environment)
    }
}

#[async_trait]
impl EnvironmentHost for InMemoryHost {
    async fn prepare(&self, environment: &str) -> Result<(), EnvironmentError> {
        tokio::task::yield_now().await;

        let mut state = self.state.lock().await;
        state.prepared.insert(environment.to_string());
        state
            .transitions
            .push(Transition::Prepared(environment.to_string()));
        debug!("Environment {} prepared", environment);
        Ok(())
    }

    async fn activate(&self, environment: &str) -> Result<(), EnvironmentError> {
        let mut state = self.state.lock().await;
        if !state.prepared.contains(environment) {
            return Err(EnvironmentError::NotPrepared(environment.to_string()));
        }
        state.active = environment.to_string();
        state
            .transitions
            .push(Transition::Activated(environment.to_string()));
        debug!("Environment {} active", environment);
        Ok(())
    }

    async fn active(&self) -> String {
        self.state.lock().await.active.clone()
    }
}
