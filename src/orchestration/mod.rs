//! # Module Orchestration
//!
//! Dependency-ordered module lifecycle.
//!
//! ## Core Components
//!
//! - **StartupGraph**: resolves the requested module set (plus transitive
//!   dependencies) into waves and rejects unknown names and cycles before
//!   anything starts
//! - **ModuleScheduler**: starts bootstrap modules, then each wave on its own
//!   threads, keeps the completion stack and stops modules in reverse
//!   completion order
//!
//! The scheduler publishes each started module's runtime objects to the
//! shared [`RuntimeObjectRegistry`](crate::registry::RuntimeObjectRegistry)
//! and withdraws them again on stop.

pub mod errors;
pub mod scheduler;
pub mod startup_graph;

pub use errors::{SchedulerError, SchedulerResult, StopFailure, StopReport};
pub use scheduler::ModuleScheduler;
pub use startup_graph::StartupGraph;
