//! # Deployment Entity
//!
//! The archive deployment, its content manifest, the running-applications
//! registry and the scoped deployment context.

pub mod archive;
pub mod context;
pub mod errors;
pub mod manifest;
pub mod run_data;

pub use archive::{
    deployment_name, normalize_context_root, ArchiveDeployment, DeploymentFailure,
    DeploymentSource, SharedDeployment,
};
pub use context::{DeploymentContext, DeploymentScope};
pub use errors::{DeploymentError, DeploymentResult};
pub use manifest::{ContentManifest, DescriptorFile};
pub use run_data::RunData;
