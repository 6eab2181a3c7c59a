//! # Structured Logging Module
//!
//! Environment-aware structured logging for the runtime. Module lifecycle
//! and deployment operations are logged through helpers so every record has
//! the same shape.

use crate::config::{ConfigManager, LoggingConfig};
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. Later calls, and calls made after another
/// global subscriber was installed, are no-ops.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let log_level = config
            .level
            .clone()
            .unwrap_or_else(|| default_log_level(&environment).to_string());

        // RUST_LOG wins over configuration
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let layer = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(config.with_thread_ids)
                .with_thread_names(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(config.with_thread_ids)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            level = %log_level,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Get log level based on environment
pub fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for module lifecycle operations
pub fn log_module_operation(operation: &str, module: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        module = %module,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "MODULE_OPERATION"
    );
}

/// Log structured data for deployment operations
pub fn log_deployment_operation(
    operation: &str,
    deployment: &str,
    context_root: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        deployment = %deployment,
        context_root = context_root,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "DEPLOYMENT_OPERATION"
    );
}
