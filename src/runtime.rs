//! # Runtime
//!
//! Top-level orchestrator that owns every shared service for one runtime
//! instance: the module registry and scheduler, the event bus, the sniffer
//! registry, the running-applications registry and the runtime-object
//! registry. Nothing here is global; tests build as many runtimes as they
//! need.
//!
//! ```rust,no_run
//! use harbor_core::config::RuntimeConfig;
//! use harbor_core::runtime::Runtime;
//!
//! # fn main() -> harbor_core::Result<()> {
//! let mut runtime = Runtime::builder(RuntimeConfig::default()).build()?;
//! runtime.start()?;
//! let site = runtime.deploy_path("apps/site.war")?;
//! println!("site is {}", site.read().phase());
//! runtime.stop()?;
//! # Ok(())
//! # }
//! ```

use crate::config::RuntimeConfig;
use crate::constants::{events, modules};
use crate::deployer::Deployer;
use crate::deployment::{ArchiveDeployment, RunData, SharedDeployment};
use crate::error::{HarborError, Result};
use crate::events::{Event, EventBus, EventListener};
use crate::module::{ConfigurationModule, LoggingModule, Module, StaticContentModule};
use crate::orchestration::{ModuleScheduler, StopReport};
use crate::registry::{
    ModuleRegistry, RuntimeObjectRegistry, SnifferFactory, SnifferRegistry,
};
use crate::state_machine::SchedulerState;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Owner name for runtime objects the runtime publishes itself
const RUNTIME_OWNER: &str = "runtime";

pub struct RuntimeBuilder {
    config: Arc<RuntimeConfig>,
    modules: Vec<Arc<dyn Module>>,
    sniffers: Vec<(String, SnifferFactory)>,
    static_content: bool,
}

impl RuntimeBuilder {
    pub fn new(config: impl Into<Arc<RuntimeConfig>>) -> Self {
        Self {
            config: config.into(),
            modules: Vec::new(),
            sniffers: Vec::new(),
            static_content: true,
        }
    }

    /// Register a module after the built-in ones
    pub fn module(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Register an additional sniffer type beside the built-in ones
    pub fn sniffer(mut self, name: impl Into<String>, factory: SnifferFactory) -> Self {
        self.sniffers.push((name.into(), factory));
        self
    }

    /// Leave the built-in `static-content` module out
    pub fn without_static_content(mut self) -> Self {
        self.static_content = false;
        self
    }

    pub fn build(self) -> Result<Runtime> {
        self.config.validate()?;

        let runtime_objects = Arc::new(RuntimeObjectRegistry::new());
        let config_module = Arc::new(ConfigurationModule::new(Arc::clone(&self.config)));

        let mut registry = ModuleRegistry::new();
        registry.register(config_module.clone())?;
        registry.register(Arc::new(LoggingModule::new(Arc::clone(&runtime_objects))))?;
        if self.static_content {
            registry.register(Arc::new(StaticContentModule::new()))?;
        }
        for module in self.modules {
            registry.register(module)?;
        }

        let sniffers = SnifferRegistry::with_builtin();
        for (name, factory) in self.sniffers {
            sniffers.register(name, factory)?;
        }
        let sniffers = Arc::new(sniffers);

        let bus = Arc::new(EventBus::new());
        let run_data = Arc::new(RunData::new());
        runtime_objects.insert_object(RUNTIME_OWNER, Arc::clone(&bus));
        runtime_objects.insert_object(RUNTIME_OWNER, Arc::clone(&run_data));
        runtime_objects.insert_object(RUNTIME_OWNER, Arc::clone(&sniffers));

        let scheduler = ModuleScheduler::new(
            Arc::new(registry),
            Arc::clone(&runtime_objects),
            self.config.scheduler.thread_name_prefix.clone(),
        );

        Ok(Runtime {
            config_module,
            scheduler,
            bus,
            sniffers,
            run_data,
            runtime_objects,
            deployer: None,
        })
    }
}

pub struct Runtime {
    config_module: Arc<ConfigurationModule>,
    scheduler: ModuleScheduler,
    bus: Arc<EventBus>,
    sniffers: Arc<SnifferRegistry>,
    run_data: Arc<RunData>,
    runtime_objects: Arc<RuntimeObjectRegistry>,
    deployer: Option<Arc<Deployer>>,
}

impl Runtime {
    pub fn builder(config: impl Into<Arc<RuntimeConfig>>) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    /// Start the configured modules and begin accepting deployments. An
    /// empty module list starts every registered module.
    ///
    /// After a failed start, calling this again returns the same error
    /// until [`Runtime::stop`] is called.
    pub fn start(&mut self) -> Result<()> {
        if matches!(
            self.scheduler.state(),
            SchedulerState::NotInitialized | SchedulerState::Stopped
        ) {
            let requested = self.requested_modules();
            self.scheduler.init(&requested)?;
        }
        self.scheduler.start()?;

        if self.deployer.is_none() {
            let deployer = Arc::new(Deployer::new(
                self.scheduler.active_modules(),
                Arc::clone(&self.sniffers),
                Arc::clone(&self.run_data),
            ));
            self.bus.register(deployer.clone());
            self.deployer = Some(deployer);

            let config = self.config_module.current();
            self.bus
                .publish_event(&Event::configuration(events::CONFIGURATION_UPDATE, config));
            info!(
                modules = ?self.scheduler.completion_order(),
                "Runtime started"
            );
        }
        Ok(())
    }

    /// Request deployment of `deployment`. Whether it was deployed, failed
    /// or matched no module is visible on the returned deployment.
    pub fn deploy(&self, deployment: ArchiveDeployment) -> Result<SharedDeployment> {
        self.ensure_running("deploy")?;
        let shared = deployment.into_shared();
        self.bus
            .publish_event(&Event::deployment(events::DEPLOYMENT_REQUESTED, Arc::clone(&shared)));
        Ok(shared)
    }

    /// Deploy an archive file or an expanded directory, applying any context
    /// root configured for its name.
    pub fn deploy_path(&self, path: impl AsRef<Path>) -> Result<SharedDeployment> {
        let path = path.as_ref();
        let mut deployment = if path.is_dir() {
            ArchiveDeployment::from_expanded(path)
        } else {
            ArchiveDeployment::from_archive(path)
        };
        let config = self.config_module.current();
        if let Some(root) = config.context_root_for(deployment.name()) {
            deployment.set_context_root(root);
        }
        self.deploy(deployment)
    }

    /// Deploy every archive listed in the configuration
    pub fn deploy_configured(&self) -> Result<Vec<SharedDeployment>> {
        let config = self.config_module.current();
        config
            .deployment
            .archives
            .iter()
            .map(|path| self.deploy_path(path))
            .collect()
    }

    pub fn undeploy(&self, deployment: &SharedDeployment) -> Result<()> {
        self.ensure_running("undeploy")?;
        self.bus
            .publish_event(&Event::deployment(events::UNDEPLOYMENT, Arc::clone(deployment)));
        Ok(())
    }

    /// Re-check the deployment's source; returns whether it is still verified
    pub fn verify(&self, deployment: &SharedDeployment) -> Result<bool> {
        self.ensure_running("verify")?;
        self.bus
            .publish_event(&Event::deployment(events::VERIFY_DEPLOYMENT, Arc::clone(deployment)));
        Ok(deployment.read().phase().is_verified())
    }

    /// Signal that a deployed application serves requests
    pub fn mark_ready(&self, deployment: &SharedDeployment) -> Result<()> {
        let deployer = self.ensure_running("mark ready")?;
        deployer.signal_ready(deployment)?;
        Ok(())
    }

    /// Replace the active configuration and announce it. Module selection
    /// takes effect on the next start.
    pub fn update_configuration(&self, config: RuntimeConfig) -> Result<()> {
        config.validate()?;
        let config = Arc::new(config);
        self.config_module.update(Arc::clone(&config));
        self.bus
            .publish_event(&Event::configuration(events::CONFIGURATION_UPDATE, config));
        Ok(())
    }

    /// Undeploy running applications, stop accepting deployments and stop
    /// every started module in reverse completion order.
    pub fn stop(&mut self) -> Result<StopReport> {
        if let Some(deployer) = self.deployer.take() {
            for deployment in self.run_data.snapshot() {
                self.bus
                    .publish_event(&Event::deployment(events::UNDEPLOYMENT, deployment));
            }
            let listener: Arc<dyn EventListener> = deployer;
            self.bus.unregister(&listener);
        }

        let report = self.scheduler.stop()?;
        for failure in &report.failures {
            warn!(module = %failure.module, error = %failure.reason, "Module did not stop cleanly");
        }
        info!(stopped = report.stopped.len(), "Runtime stopped");
        Ok(report)
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn config(&self) -> Arc<RuntimeConfig> {
        self.config_module.current()
    }

    pub fn scheduler(&self) -> &ModuleScheduler {
        &self.scheduler
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn run_data(&self) -> &Arc<RunData> {
        &self.run_data
    }

    pub fn runtime_objects(&self) -> &Arc<RuntimeObjectRegistry> {
        &self.runtime_objects
    }

    pub fn sniffers(&self) -> &Arc<SnifferRegistry> {
        &self.sniffers
    }

    pub fn deployer(&self) -> Option<&Arc<Deployer>> {
        self.deployer.as_ref()
    }

    fn requested_modules(&self) -> Vec<String> {
        let config = self.config_module.current();
        if config.modules.is_empty() {
            self.scheduler
                .registry()
                .names()
                .into_iter()
                .filter(|name| !modules::is_bootstrap(name))
                .map(str::to_string)
                .collect()
        } else {
            config.requested_modules()
        }
    }

    fn ensure_running(&self, operation: &str) -> Result<&Arc<Deployer>> {
        self.deployer
            .as_ref()
            .filter(|_| self.scheduler.state().is_running())
            .ok_or_else(|| {
                HarborError::Runtime(format!(
                    "cannot {operation} while runtime is {}",
                    self.scheduler.state()
                ))
            })
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("bus", &self.bus)
            .field("running_applications", &self.run_data.len())
            .finish()
    }
}
