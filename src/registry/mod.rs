//! # Registry Infrastructure
//!
//! Lookup tables shared by the scheduler and the deployment pipeline.
//!
//! - **ModuleRegistry**: modules known to a runtime, in registration order
//! - **SnifferRegistry**: sniffer factories keyed by sniffer type
//! - **RuntimeObjectRegistry**: typed objects modules expose to each other

pub mod errors;
pub mod module_registry;
pub mod runtime_objects;
pub mod sniffer_registry;

pub use errors::{RegistryError, RegistryResult};
pub use module_registry::{first_serving, ModuleRegistry};
pub use runtime_objects::{runtime_object, RuntimeObject, RuntimeObjectKey, RuntimeObjectRegistry};
pub use sniffer_registry::{SnifferFactory, SnifferRegistry};
