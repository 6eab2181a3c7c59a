//! Error types for the Harbor runtime.
//!
//! Each subsystem owns a focused error enum; [`HarborError`] is the crate-level
//! umbrella used by the [`Runtime`](crate::runtime::Runtime) surface.

use crate::classifier::ClassLoadError;
use crate::config::ConfigurationError;
use crate::constants::exit_codes;
use crate::deployment::DeploymentError;
use crate::events::EventError;
use crate::orchestration::SchedulerError;
use crate::registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarborError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    ClassLoad(#[from] ClassLoadError),
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl HarborError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Scheduler(e) => e.exit_code(),
            Self::Registry(_) | Self::Configuration(_) => exit_codes::CONFIGURATION_ERROR,
            _ => exit_codes::RUNTIME_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarborError>;

/// Run a module hook, turning an error or a panic into a reason string
pub(crate) fn run_hook(hook: impl FnOnce() -> anyhow::Result<()>) -> std::result::Result<(), String> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(format!("{error:#}")),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

/// Readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
