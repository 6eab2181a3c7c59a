//! The two modules every runtime starts first: `config` and `logging`.

use super::Module;
use crate::config::RuntimeConfig;
use crate::constants::modules;
use crate::logging;
use crate::registry::{runtime_object, RuntimeObject, RuntimeObjectKey, RuntimeObjectRegistry};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Holds the active runtime configuration and exposes it to other modules.
pub struct ConfigurationModule {
    config: RwLock<Arc<RuntimeConfig>>,
}

impl ConfigurationModule {
    pub fn new(config: Arc<RuntimeConfig>) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn current(&self) -> Arc<RuntimeConfig> {
        Arc::clone(&self.config.read())
    }

    /// Replace the active configuration; returns the previous one
    pub fn update(&self, config: Arc<RuntimeConfig>) -> Arc<RuntimeConfig> {
        std::mem::replace(&mut *self.config.write(), config)
    }
}

impl Module for ConfigurationModule {
    fn name(&self) -> &str {
        modules::CONFIGURATION
    }

    fn start(&self) -> anyhow::Result<()> {
        let config = self.current();
        config.validate()?;
        info!(
            environment = %config.environment,
            requested = ?config.modules,
            "Configuration active"
        );
        Ok(())
    }

    fn exposed_runtime_object_types(&self) -> Vec<RuntimeObjectKey> {
        vec![RuntimeObjectKey::of::<RuntimeConfig>()]
    }

    fn get_runtime_object(&self, key: &RuntimeObjectKey) -> Option<RuntimeObject> {
        (*key == RuntimeObjectKey::of::<RuntimeConfig>()).then(|| runtime_object(self.current()))
    }
}

/// Installs structured logging from the configuration published by the
/// `config` module.
pub struct LoggingModule {
    runtime_objects: Arc<RuntimeObjectRegistry>,
}

impl LoggingModule {
    pub fn new(runtime_objects: Arc<RuntimeObjectRegistry>) -> Self {
        Self { runtime_objects }
    }
}

impl Module for LoggingModule {
    fn name(&self) -> &str {
        modules::LOGGING
    }

    fn start(&self) -> anyhow::Result<()> {
        let config = self
            .runtime_objects
            .lookup::<RuntimeConfig>()
            .unwrap_or_default();
        logging::init_structured_logging(&config.logging);
        Ok(())
    }
}
