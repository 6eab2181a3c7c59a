#![allow(clippy::doc_markdown)] // Allow technical terms like WEB-INF, JAX-RS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Harbor Core
//!
//! Modular application runtime: boots independently developed modules in
//! dependency order, then routes deployable web archives to the module best
//! able to serve them.
//!
//! ## Architecture
//!
//! Two subsystems carry the weight:
//!
//! - **Module lifecycle**: the [`orchestration`] scheduler resolves the
//!   requested modules into dependency waves, starts each wave concurrently,
//!   aborts the whole startup on the first failure and stops modules in
//!   reverse completion order.
//! - **Deployment pipeline**: the [`deployer`] listens for deployment
//!   requests on the [`events`] bus, runs the [`classifier`] sniffers over the
//!   archive content, hands the archive to the first module serving a
//!   detected specification and publishes pre/post-deployment events.
//!
//! ## Module Organization
//!
//! - [`runtime`] - Top-level orchestrator owning every shared service
//! - [`module`] - Module contract plus the built-in `config`, `logging` and
//!   `static-content` modules
//! - [`orchestration`] - Startup graph and module scheduler
//! - [`deployer`] - Deployment pipeline
//! - [`deployment`] - Archive deployment entity, content manifests, running
//!   applications registry
//! - [`classifier`] - Specifications, sniffers, class-file reader
//! - [`state_machine`] - Deployment phases and scheduler states
//! - [`events`] - Synchronous event bus
//! - [`registry`] - Module, sniffer and runtime-object registries
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use harbor_core::config::ConfigManager;
//! use harbor_core::Runtime;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let mut runtime = Runtime::builder(manager.config_arc()).build()?;
//! runtime.start()?;
//! for deployment in runtime.deploy_configured()? {
//!     let deployment = deployment.read();
//!     println!("{} at {}: {}", deployment.name(), deployment.context_root(), deployment.phase());
//! }
//! runtime.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod constants;
pub mod deployer;
pub mod deployment;
pub mod error;
pub mod events;
pub mod logging;
pub mod module;
pub mod orchestration;
pub mod registry;
pub mod runtime;
pub mod state_machine;

pub use classifier::{Sniffer, Specification, SpecificationClassifier};
pub use config::{ConfigManager, RuntimeConfig};
pub use deployer::{Deployer, DeploymentOutcome};
pub use deployment::{ArchiveDeployment, RunData, SharedDeployment};
pub use error::{HarborError, Result};
pub use events::{Event, EventBus, EventListener, EventPayload};
pub use module::Module;
pub use orchestration::{ModuleScheduler, SchedulerError, StartupGraph, StopReport};
pub use registry::{ModuleRegistry, RuntimeObjectRegistry, SnifferRegistry};
pub use runtime::{Runtime, RuntimeBuilder};
pub use state_machine::{DeploymentPhase, SchedulerState};
