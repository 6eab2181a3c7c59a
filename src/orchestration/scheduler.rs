//! # Module Scheduler
//!
//! Starts a resolved [`StartupGraph`] and tears it down again.
//!
//! The bootstrap modules start sequentially on the caller's thread. Each
//! following wave starts concurrently, one named thread per module, and the
//! caller blocks until the whole wave has reported back. Modules are pushed
//! onto the completion stack in the order they finished starting; `stop`
//! pops that stack, so a module is never stopped before anything that
//! depends on it.
//!
//! A start failure is terminal for the scheduler: later `start` calls return
//! the same error without touching any module until `stop` resets it.

use super::errors::{SchedulerError, SchedulerResult, StopFailure, StopReport};
use super::startup_graph::StartupGraph;
use crate::error::run_hook;
use crate::logging::log_module_operation;
use crate::module::Module;
use crate::registry::{ModuleRegistry, RuntimeObjectRegistry};
use crate::state_machine::{SchedulerEvent, SchedulerState};
use crossbeam::channel;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

type StartOutcome = Result<(), String>;

pub struct ModuleScheduler {
    registry: Arc<ModuleRegistry>,
    runtime_objects: Arc<RuntimeObjectRegistry>,
    thread_prefix: String,
    state: SchedulerState,
    graph: Option<StartupGraph>,
    completion_stack: Vec<String>,
    failure: Option<SchedulerError>,
}

impl ModuleScheduler {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        runtime_objects: Arc<RuntimeObjectRegistry>,
        thread_prefix: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            runtime_objects,
            thread_prefix: thread_prefix.into(),
            state: SchedulerState::NotInitialized,
            graph: None,
            completion_stack: Vec::new(),
            failure: None,
        }
    }

    /// Resolve the requested module set. Nothing starts here; resolution
    /// errors leave the scheduler in its previous state.
    pub fn init(&mut self, requested: &[String]) -> SchedulerResult<()> {
        let next = self.next_state(SchedulerEvent::Initialize, "initialize")?;

        let graph = StartupGraph::build(&self.registry, requested).map_err(|e| {
            error!(error = %e, "Module set rejected");
            e
        })?;

        info!(
            requested = ?requested,
            modules = graph.len(),
            waves = graph.waves().len(),
            "Module scheduler initialized"
        );
        self.graph = Some(graph);
        self.state = next;
        Ok(())
    }

    /// Start every resolved module, wave by wave.
    pub fn start(&mut self) -> SchedulerResult<()> {
        match self.state {
            SchedulerState::Running => {
                debug!("Module scheduler already running");
                return Ok(());
            }
            SchedulerState::Failed => {
                if let Some(failure) = &self.failure {
                    warn!(error = %failure, "Start requested after a failed startup");
                    return Err(failure.clone());
                }
            }
            _ => {}
        }
        let graph = match (&self.graph, self.state.can_start()) {
            (Some(graph), true) => graph.clone(),
            (None, _) => return Err(SchedulerError::NotInitialized),
            (Some(_), false) => {
                return Err(SchedulerError::InvalidState {
                    state: self.state.to_string(),
                    operation: "start",
                })
            }
        };

        let started_at = Instant::now();
        info!(modules = graph.len(), "Starting modules");

        for name in graph.bootstrap() {
            let module = self.module(name)?;
            debug!(module = %name, "Starting bootstrap module");
            match run_hook(|| module.start()) {
                Ok(()) => self.complete(name, &module),
                Err(reason) => return Err(self.abort(name, reason)),
            }
        }

        for (index, wave) in graph.waves().iter().enumerate() {
            debug!(wave = index, modules = ?wave, "Starting wave");
            let outcomes = self.start_wave(wave)?;

            let mut first_failure = None;
            for (name, module, outcome) in outcomes {
                match outcome {
                    Ok(()) => self.complete(&name, &module),
                    Err(reason) => {
                        error!(module = %name, error = %reason, "Module failed to start");
                        first_failure.get_or_insert((name, reason));
                    }
                }
            }
            if let Some((name, reason)) = first_failure {
                return Err(self.abort(&name, reason));
            }
        }

        self.state = self.next_state(SchedulerEvent::Started, "start")?;
        info!(
            modules = self.completion_stack.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "All modules started"
        );
        Ok(())
    }

    /// `init` followed by `start`
    pub fn start_modules(&mut self, requested: &[String]) -> SchedulerResult<()> {
        self.init(requested)?;
        self.start()
    }

    /// Stop started modules in reverse completion order. A failing `stop`
    /// hook is recorded and teardown carries on. Also clears a failed
    /// startup so the scheduler can be started again.
    pub fn stop(&mut self) -> SchedulerResult<StopReport> {
        let next = self.next_state(SchedulerEvent::Stop, "stop")?;
        let mut report = StopReport::default();

        while let Some(name) = self.completion_stack.pop() {
            let Some(module) = self.registry.get(&name).cloned() else {
                continue;
            };
            match run_hook(|| module.stop()) {
                Ok(()) => log_module_operation("stop", &name, "completed", None),
                Err(reason) => {
                    warn!(module = %name, error = %reason, "Module failed to stop");
                    log_module_operation("stop", &name, "failed", Some(&reason));
                    report.failures.push(StopFailure {
                        module: name.clone(),
                        reason,
                    });
                }
            }
            self.runtime_objects.unregister_module(&name);
            report.stopped.push(name);
        }

        self.failure = None;
        self.state = next;
        info!(
            stopped = report.stopped.len(),
            failures = report.failures.len(),
            "Modules stopped"
        );
        Ok(report)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Modules in the order they finished starting
    pub fn completion_order(&self) -> &[String] {
        &self.completion_stack
    }

    pub fn waves(&self) -> &[Vec<String>] {
        self.graph.as_ref().map(StartupGraph::waves).unwrap_or(&[])
    }

    pub fn graph(&self) -> Option<&StartupGraph> {
        self.graph.as_ref()
    }

    /// Started modules, in registration order
    pub fn active_modules(&self) -> Vec<Arc<dyn Module>> {
        self.registry
            .iter()
            .filter(|m| self.completion_stack.iter().any(|n| n == m.name()))
            .cloned()
            .collect()
    }

    pub fn failure(&self) -> Option<&SchedulerError> {
        self.failure.as_ref()
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    fn module(&self, name: &str) -> SchedulerResult<Arc<dyn Module>> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownModule {
                name: name.to_string(),
            })
    }

    fn next_state(
        &self,
        event: SchedulerEvent,
        operation: &'static str,
    ) -> SchedulerResult<SchedulerState> {
        self.state
            .transition(event)
            .map_err(|_| SchedulerError::InvalidState {
                state: self.state.to_string(),
                operation,
            })
    }

    /// Run one wave on scoped threads. Outcomes come back in the order the
    /// modules finished.
    fn start_wave(
        &self,
        wave: &[String],
    ) -> SchedulerResult<Vec<(String, Arc<dyn Module>, StartOutcome)>> {
        let modules = wave
            .iter()
            .map(|name| Ok((name.clone(), self.module(name)?)))
            .collect::<SchedulerResult<Vec<_>>>()?;

        let (sender, receiver) = channel::unbounded();
        let scoped = crossbeam::thread::scope(|scope| {
            for (index, (name, module)) in modules.iter().enumerate() {
                let thread_sender = sender.clone();
                let spawned = scope
                    .builder()
                    .name(format!("{}-{}", self.thread_prefix, name))
                    .spawn(move |_| {
                        debug!(module = %name, "Starting module");
                        let _ = thread_sender.send((index, run_hook(|| module.start())));
                    });
                if let Err(e) = spawned {
                    let _ = sender.send((index, Err(format!("could not spawn start thread: {e}"))));
                }
            }
        });
        drop(sender);
        if scoped.is_err() {
            error!(modules = ?wave, "Wave thread panicked outside a module start");
        }

        let mut outcomes: Vec<(String, Arc<dyn Module>, StartOutcome)> = Vec::with_capacity(modules.len());
        let mut reported = vec![false; modules.len()];
        for (index, outcome) in receiver.iter() {
            reported[index] = true;
            let (name, module) = &modules[index];
            outcomes.push((name.clone(), Arc::clone(module), outcome));
        }
        for (index, (name, module)) in modules.iter().enumerate() {
            if !reported[index] {
                outcomes.push((
                    name.clone(),
                    Arc::clone(module),
                    Err("start thread exited without reporting".to_string()),
                ));
            }
        }
        Ok(outcomes)
    }

    fn complete(&mut self, name: &str, module: &Arc<dyn Module>) {
        self.completion_stack.push(name.to_string());
        let exposed = self.runtime_objects.register_module(module);
        log_module_operation(
            "start",
            name,
            "completed",
            (exposed > 0).then(|| format!("{exposed} runtime objects")).as_deref(),
        );
    }

    fn abort(&mut self, name: &str, reason: String) -> SchedulerError {
        let failure = SchedulerError::StartupAborted {
            module: name.to_string(),
            reason,
        };
        error!(module = %name, error = %failure, "Module startup aborted");
        log_module_operation("start", name, "failed", Some(&failure.to_string()));

        self.failure = Some(failure.clone());
        match self.next_state(SchedulerEvent::Fail, "start") {
            Ok(next) => self.state = next,
            Err(e) => warn!(error = %e, "Startup failure recorded outside a startup"),
        }
        failure
    }
}

impl std::fmt::Debug for ModuleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleScheduler")
            .field("state", &self.state)
            .field("completion_stack", &self.completion_stack)
            .field("failure", &self.failure)
            .finish()
    }
}
