//! Event listeners that record what they saw.

use harbor_core::events::{Event, EventBus, EventError, EventListener};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded delivery: event code plus the deployment name, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub code: String,
    pub deployment: Option<String>,
}

/// Records every event whose code starts with one of `prefixes` (all
/// events when empty).
#[derive(Default)]
pub struct RecordingListener {
    name: String,
    prefixes: Vec<String>,
    seen: Mutex<Vec<Seen>>,
}

impl RecordingListener {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    pub fn filtered(name: &str, prefixes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn codes(&self) -> Vec<String> {
        self.seen.lock().iter().map(|s| s.code.clone()).collect()
    }

    pub fn count(&self, code: &str) -> usize {
        self.seen.lock().iter().filter(|s| s.code == code).count()
    }
}

impl EventListener for RecordingListener {
    fn on_event(&self, event: &Event, _bus: &EventBus) -> Result<(), EventError> {
        if !self.prefixes.is_empty() && !self.prefixes.iter().any(|p| event.code.starts_with(p)) {
            return Ok(());
        }
        // The deployer releases its lock before publishing
        let deployment = event
            .deployment_payload()
            .map(|d| d.read().name().to_string());
        self.seen.lock().push(Seen {
            code: event.code.clone(),
            deployment,
        });
        Ok(())
    }

    fn listener_name(&self) -> &str {
        &self.name
    }
}

/// Register `listener` on `bus` as a trait object
pub fn attach<L: EventListener + 'static>(bus: &EventBus, listener: &Arc<L>) -> Arc<dyn EventListener> {
    let listener: Arc<dyn EventListener> = listener.clone();
    bus.register(Arc::clone(&listener));
    listener
}
