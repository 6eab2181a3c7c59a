// State machine module for module lifecycle and deployment phases
//
// Deployment phases are derived from recorded facts rather than set directly;
// the scheduler state advances through an explicit transition table.

pub mod errors;
pub mod events;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::SchedulerEvent;
pub use states::{DeploymentPhase, PhaseFacts, SchedulerState};
