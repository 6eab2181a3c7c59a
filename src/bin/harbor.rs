//! Harbor Runtime Binary
//!
//! Loads configuration (`HARBOR_CONFIG_DIR`, `HARBOR_ENV`, `HARBOR_*`),
//! starts the configured modules, deploys the configured archives and runs
//! until Ctrl-C.

use std::process;
use tokio::signal;
use tracing::{error, info, warn};

use harbor_core::config::ConfigManager;
use harbor_core::constants::exit_codes;
use harbor_core::logging::init_structured_logging;
use harbor_core::Runtime;

#[tokio::main]
async fn main() {
    process::exit(run().await);
}

async fn run() -> i32 {
    let manager = match ConfigManager::load() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return exit_codes::CONFIGURATION_ERROR;
        }
    };
    init_structured_logging(&manager.config().logging);

    info!(
        environment = manager.environment(),
        config_directory = %manager.config_directory().display(),
        "Starting Harbor runtime"
    );

    let runtime = match Runtime::builder(manager.config_arc()).build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build runtime");
            return e.exit_code();
        }
    };

    // Module start hooks block, keep them off the async workers
    let started = tokio::task::spawn_blocking(move || {
        let mut runtime = runtime;
        runtime.start().map(|()| runtime)
    })
    .await;

    let mut runtime = match started {
        Ok(Ok(runtime)) => runtime,
        Ok(Err(e)) => {
            error!(error = %e, "Startup aborted");
            return e.exit_code();
        }
        Err(e) => {
            error!(error = %e, "Startup task failed");
            return exit_codes::RUNTIME_ERROR;
        }
    };

    match runtime.deploy_configured() {
        Ok(deployments) => {
            for deployment in deployments {
                let deployment = deployment.read();
                info!(
                    deployment = deployment.name(),
                    context_root = deployment.context_root(),
                    phase = %deployment.phase(),
                    "Deployment processed"
                );
            }
        }
        Err(e) => warn!(error = %e, "Configured deployments were not processed"),
    }

    info!(modules = ?runtime.scheduler().completion_order(), "Harbor runtime ready");

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");

    let stopped = tokio::task::spawn_blocking(move || runtime.stop()).await;
    match stopped {
        Ok(Ok(report)) if report.is_clean() => {
            info!(stopped = report.stopped.len(), "Harbor runtime stopped");
            exit_codes::SUCCESS
        }
        Ok(Ok(report)) => {
            warn!(failures = report.failures.len(), "Harbor runtime stopped with failures");
            exit_codes::RUNTIME_ERROR
        }
        Ok(Err(e)) => {
            error!(error = %e, "Shutdown failed");
            e.exit_code()
        }
        Err(e) => {
            error!(error = %e, "Shutdown task failed");
            exit_codes::RUNTIME_ERROR
        }
    }
}
