use super::errors::{StateMachineError, StateMachineResult};
use super::states::SchedulerState;
use serde::{Deserialize, Serialize};

/// Events that drive [`SchedulerState`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerEvent {
    /// Module set resolved and validated
    Initialize,
    /// Every module started
    Started,
    /// A module failed to start
    Fail,
    /// Completion stack drained
    Stop,
}

impl SchedulerEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Started => "started",
            Self::Fail => "fail",
            Self::Stop => "stop",
        }
    }
}

impl SchedulerState {
    /// Determine the target state for `event`, rejecting transitions the
    /// scheduler lifecycle does not allow.
    pub fn transition(self, event: SchedulerEvent) -> StateMachineResult<SchedulerState> {
        let target = match (self, event) {
            (Self::NotInitialized | Self::Ready | Self::Stopped, SchedulerEvent::Initialize) => {
                Self::Ready
            }

            (Self::Ready | Self::Stopped, SchedulerEvent::Started) => Self::Running,
            (Self::Ready | Self::Stopped, SchedulerEvent::Fail) => Self::Failed,

            // Stop is also the explicit reset out of a failed startup
            (
                Self::Ready | Self::Running | Self::Stopped | Self::Failed,
                SchedulerEvent::Stop,
            ) => Self::Stopped,

            (from, event) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(from.to_string()),
                    to: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
