//! Configuration Loader
//!
//! Environment-aware loading: defaults, then `harbor.yaml`, then
//! `harbor.<environment>.yaml`, then `HARBOR_*` environment variables, each
//! layer overriding the previous one.

use super::error::ConfigResult;
use super::RuntimeConfig;
use crate::constants::defaults;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct ConfigManager {
    config: Arc<RuntimeConfig>,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<ConfigManager> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<ConfigManager> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for testing without modifying global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<ConfigManager> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_layers(&config_directory, environment)?;
        config.validate()?;

        debug!(
            modules = ?config.modules,
            archives = config.deployment.archives.len(),
            "Configuration loaded"
        );

        Ok(ConfigManager {
            config: Arc::new(config),
            environment: environment.to_string(),
            config_directory,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn config_arc(&self) -> Arc<RuntimeConfig> {
        Arc::clone(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment: HARBOR_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("HARBOR_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("HARBOR_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_layers(config_directory: &Path, environment: &str) -> ConfigResult<RuntimeConfig> {
        let base = config_directory.join(format!("{}.yaml", defaults::CONFIG_FILE_STEM));
        let overrides = config_directory.join(format!(
            "{}.{environment}.yaml",
            defaults::CONFIG_FILE_STEM
        ));

        let config = Config::builder()
            .add_source(Config::try_from(&RuntimeConfig::default())?)
            .add_source(File::from(base.as_path()).required(false))
            .add_source(File::from(overrides.as_path()).required(false))
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("modules")
                    .try_parsing(true),
            )
            .set_override("environment", environment)?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("environment", &self.environment)
            .field("config_directory", &self.config_directory)
            .finish()
    }
}
