//! # Runtime Configuration
//!
//! Configuration for a runtime instance: which modules to start, how to log,
//! which archives to deploy at boot and how the scheduler names its worker
//! threads. Every field has a default, so an empty configuration is valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use harbor_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // harbor.yaml, harbor.<env>.yaml, then HARBOR_* variables
//! let manager = ConfigManager::load()?;
//! println!("starting modules {:?}", manager.config().modules);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{defaults, modules};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub environment: String,
    /// Modules to start; empty starts every registered module
    pub modules: Vec<String>,
    pub logging: LoggingConfig,
    pub deployment: DeploymentConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; derived from the environment when unset
    pub level: Option<String>,
    pub json: bool,
    pub with_thread_ids: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Archives or expanded directories deployed once startup completes
    pub archives: Vec<PathBuf>,
    /// Context root overrides keyed by deployment name
    pub context_roots: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub thread_name_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: defaults::ENVIRONMENT.to_string(),
            modules: Vec::new(),
            logging: LoggingConfig::default(),
            deployment: DeploymentConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: defaults::WAVE_THREAD_PREFIX.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.environment.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "environment",
                "runtime configuration",
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.modules {
            if name.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "modules",
                    name.clone(),
                    "module names cannot be empty",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "modules",
                    name.clone(),
                    "module requested more than once",
                ));
            }
        }

        if self.scheduler.thread_name_prefix.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "scheduler.thread_name_prefix",
                "scheduler configuration",
            ));
        }

        for (name, root) in &self.deployment.context_roots {
            if root.contains(char::is_whitespace) {
                return Err(ConfigurationError::invalid_value(
                    format!("deployment.context_roots.{name}"),
                    root.clone(),
                    "context roots cannot contain whitespace",
                ));
            }
        }

        Ok(())
    }

    /// Requested modules without the bootstrap modules, which always start
    pub fn requested_modules(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|m| !modules::is_bootstrap(m))
            .cloned()
            .collect()
    }

    pub fn context_root_for(&self, deployment_name: &str) -> Option<&str> {
        self.deployment
            .context_roots
            .get(deployment_name)
            .map(String::as_str)
    }
}
