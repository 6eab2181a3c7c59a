//! # Modules
//!
//! A module is a named unit of functionality the scheduler starts and stops
//! in dependency order and the deployer can hand deployments to.
//!
//! Lifecycle hooks run on scheduler worker threads and may block. They
//! return `anyhow::Result` so collaborator modules can surface any error;
//! the scheduler turns a start failure into an aborted startup.

pub mod bootstrap;
pub mod static_content;

use crate::classifier::Specification;
use crate::deployment::ArchiveDeployment;
use crate::registry::{RuntimeObject, RuntimeObjectKey};

pub use bootstrap::{ConfigurationModule, LoggingModule};
pub use static_content::{StaticContentIndex, StaticContentModule};

pub trait Module: Send + Sync {
    /// Unique within a runtime instance
    fn name(&self) -> &str;

    /// Names of modules that must complete starting before this one starts
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Specifications this module can serve deployments for
    fn provided_specifications(&self) -> Vec<Specification> {
        Vec::new()
    }

    /// Sniffer type used to detect this module's specifications
    fn sniffer_type(&self) -> Option<&str> {
        None
    }

    fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Take ownership of a prepared deployment. An error marks the
    /// deployment failed.
    fn register_deployment(&self, _deployment: &mut ArchiveDeployment) -> anyhow::Result<()> {
        Ok(())
    }

    fn unregister_deployment(&self, _deployment: &ArchiveDeployment) -> anyhow::Result<()> {
        Ok(())
    }

    /// Types other modules may look up once this module has started
    fn exposed_runtime_object_types(&self) -> Vec<RuntimeObjectKey> {
        Vec::new()
    }

    fn get_runtime_object(&self, _key: &RuntimeObjectKey) -> Option<RuntimeObject> {
        None
    }
}
