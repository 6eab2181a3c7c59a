use crate::config::RuntimeConfig;
use crate::deployment::SharedDeployment;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Opaque event payload.
///
/// Deployment events always carry the affected deployment; configuration
/// updates carry the active runtime configuration.
#[derive(Debug, Clone)]
pub enum EventPayload {
    Deployment(SharedDeployment),
    Configuration(Arc<RuntimeConfig>),
    Data(Value),
    Empty,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct Event {
    pub code: String,
    pub payload: EventPayload,
    pub published_at: DateTime<Utc>,
}

impl Event {
    pub fn new(code: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            code: code.into(),
            payload,
            published_at: Utc::now(),
        }
    }

    pub fn deployment(code: impl Into<String>, deployment: SharedDeployment) -> Self {
        Self::new(code, EventPayload::Deployment(deployment))
    }

    pub fn configuration(code: impl Into<String>, config: Arc<RuntimeConfig>) -> Self {
        Self::new(code, EventPayload::Configuration(config))
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    pub fn deployment_payload(&self) -> Option<&SharedDeployment> {
        match &self.payload {
            EventPayload::Deployment(deployment) => Some(deployment),
            _ => None,
        }
    }

    pub fn configuration_payload(&self) -> Option<&Arc<RuntimeConfig>> {
        match &self.payload {
            EventPayload::Configuration(config) => Some(config),
            _ => None,
        }
    }
}
