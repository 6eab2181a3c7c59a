//! Modules that record their lifecycle into a shared log.

use harbor_core::classifier::Specification;
use harbor_core::deployment::ArchiveDeployment;
use harbor_core::module::Module;
use harbor_core::registry::ModuleRegistry;
use parking_lot::Mutex;
use std::sync::Arc;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub type StartHook = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Logs `"<name> start"` / `"<name> end"` around `start` and
/// `"<name> stop"` on `stop`.
pub struct RecordingModule {
    name: String,
    dependencies: Vec<String>,
    specifications: Vec<Specification>,
    sniffer: Option<String>,
    fail_start: bool,
    fail_stop: bool,
    fail_registration: bool,
    start_hook: Option<StartHook>,
    log: EventLog,
}

impl RecordingModule {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            dependencies: Vec::new(),
            specifications: Vec::new(),
            sniffer: None,
            fail_start: false,
            fail_stop: false,
            fail_registration: false,
            start_hook: None,
            log: Arc::clone(log),
        }
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    pub fn serving(mut self, specification: Specification, sniffer: &str) -> Self {
        self.specifications.push(specification);
        self.sniffer = Some(sniffer.to_string());
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn failing_registration(mut self) -> Self {
        self.fail_registration = true;
        self
    }

    /// Runs between the "start" and "end" log entries
    pub fn on_start(mut self, hook: StartHook) -> Self {
        self.start_hook = Some(hook);
        self
    }

    pub fn shared(self) -> Arc<dyn Module> {
        Arc::new(self)
    }

    fn record(&self, what: &str) {
        self.log.lock().push(format!("{} {what}", self.name));
    }
}

impl Module for RecordingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn provided_specifications(&self) -> Vec<Specification> {
        self.specifications.clone()
    }

    fn sniffer_type(&self) -> Option<&str> {
        self.sniffer.as_deref()
    }

    fn start(&self) -> anyhow::Result<()> {
        self.record("start");
        if let Some(hook) = &self.start_hook {
            hook()?;
        }
        if self.fail_start {
            anyhow::bail!("{} refused to start", self.name);
        }
        self.record("end");
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        self.record("stop");
        if self.fail_stop {
            anyhow::bail!("{} refused to stop", self.name);
        }
        Ok(())
    }

    fn register_deployment(&self, deployment: &mut ArchiveDeployment) -> anyhow::Result<()> {
        self.record(&format!("register {}", deployment.name()));
        if self.fail_registration {
            anyhow::bail!("{} rejected {}", self.name, deployment.name());
        }
        Ok(())
    }

    fn unregister_deployment(&self, deployment: &ArchiveDeployment) -> anyhow::Result<()> {
        self.record(&format!("unregister {}", deployment.name()));
        Ok(())
    }
}

/// Registry holding recording `config` and `logging` modules followed by
/// `modules`.
pub fn registry_with_bootstrap(log: &EventLog, modules: Vec<RecordingModule>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for name in harbor_core::constants::modules::BOOTSTRAP {
        registry
            .register(RecordingModule::new(name, log).shared())
            .expect("bootstrap module registers");
    }
    for module in modules {
        registry.register(module.shared()).expect("module registers");
    }
    registry
}

/// Entries of `log` that end with `suffix`, with the suffix removed
pub fn entries_ending_with(log: &EventLog, suffix: &str) -> Vec<String> {
    log.lock()
        .iter()
        .filter_map(|e| e.strip_suffix(suffix).map(str::to_string))
        .collect()
}
