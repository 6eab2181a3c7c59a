use crate::constants::exit_codes;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while resolving or running the module lifecycle.
///
/// `Clone` so a failed startup can hand back the same error on every later
/// `start` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Unknown module: {name}")]
    UnknownModule { name: String },

    #[error("Module {module} depends on unknown module {dependency}")]
    UnknownDependency { module: String, dependency: String },

    #[error("Dependency cycle: {}", modules.join(" -> "))]
    DependencyCycle { modules: Vec<String> },

    #[error("Scheduler has not been initialized")]
    NotInitialized,

    #[error("Startup aborted: module {module} failed to start: {reason}")]
    StartupAborted { module: String, reason: String },

    #[error("Cannot {operation} while scheduler is {state}")]
    InvalidState {
        state: String,
        operation: &'static str,
    },
}

impl SchedulerError {
    /// Errors found while resolving the module set, before anything started
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownModule { .. } | Self::UnknownDependency { .. } | Self::DependencyCycle { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StartupAborted { .. } => exit_codes::STARTUP_ABORTED,
            e if e.is_configuration_error() => exit_codes::CONFIGURATION_ERROR,
            _ => exit_codes::RUNTIME_ERROR,
        }
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// A module whose `stop` hook failed during teardown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopFailure {
    pub module: String,
    pub reason: String,
}

/// Outcome of a best-effort teardown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopReport {
    /// Modules in the order they were stopped
    pub stopped: Vec<String>,
    pub failures: Vec<StopFailure>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
