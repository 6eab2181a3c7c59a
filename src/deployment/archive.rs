//! # Archive Deployment
//!
//! One deployable application moving through the pipeline. The phase is
//! never set directly: it is resolved from what has been recorded on the
//! deployment (source location, preparation inputs, registration outcome,
//! readiness).

use super::errors::{DeploymentError, DeploymentResult};
use super::manifest::ContentManifest;
use crate::classifier::{ClassLoader, SnifferReport, Specification};
use crate::constants::archive;
use crate::module::Module;
use crate::state_machine::{DeploymentPhase, PhaseFacts};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub type SharedDeployment = Arc<RwLock<ArchiveDeployment>>;

/// Where a deployment's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DeploymentSource {
    /// Packed `.war` file
    Archive(PathBuf),
    /// Already-expanded directory
    Expanded(PathBuf),
}

impl DeploymentSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::Expanded(path) => path,
        }
    }

    pub fn exists(&self) -> bool {
        match self {
            Self::Archive(path) => path.is_file(),
            Self::Expanded(path) => path.is_dir(),
        }
    }
}

/// Error recorded when the owning module failed to register a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentFailure {
    pub module: Option<String>,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl fmt::Display for DeploymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Derive a deployment name from an archive path: `shop.war` -> `shop`
pub fn deployment_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.strip_suffix(archive::WAR_EXTENSION) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

/// Leading slash, no trailing slash, `/` for the root context.
pub fn normalize_context_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        archive::ROOT_CONTEXT.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn default_context_root(name: &str) -> String {
    if name == "ROOT" {
        archive::ROOT_CONTEXT.to_string()
    } else {
        normalize_context_root(name)
    }
}

pub struct ArchiveDeployment {
    id: Uuid,
    name: String,
    source: Option<DeploymentSource>,
    context_root: String,
    manifest: Option<ContentManifest>,
    class_loader: Option<Arc<dyn ClassLoader>>,
    specifications: Option<BTreeSet<Specification>>,
    sniffers: Option<Vec<SnifferReport>>,
    module: Option<Arc<dyn Module>>,
    metadata: BTreeMap<String, String>,
    exception: Option<DeploymentFailure>,
    registered: bool,
    ready: bool,
    deploying: bool,
    created_at: DateTime<Utc>,
}

impl ArchiveDeployment {
    /// Unverified deployment with an explicit name and no source yet
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            context_root: default_context_root(&name),
            name,
            source: None,
            manifest: None,
            class_loader: None,
            specifications: None,
            sniffers: None,
            module: None,
            metadata: BTreeMap::new(),
            exception: None,
            registered: false,
            ready: false,
            deploying: false,
            created_at: Utc::now(),
        }
    }

    /// Deployment of a packed archive; verified on construction
    pub fn from_archive(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut deployment = Self::new(deployment_name(&path));
        deployment.source = Some(DeploymentSource::Archive(path));
        deployment
    }

    /// Deployment of an already-expanded directory; verified on construction
    pub fn from_expanded(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut deployment = Self::new(deployment_name(&path));
        deployment.source = Some(DeploymentSource::Expanded(path));
        deployment
    }

    /// Override the derived name; the context root follows unless it was
    /// set explicitly.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let follows_name = self.context_root == default_context_root(&self.name);
        self.name = name.into();
        if follows_name {
            self.context_root = default_context_root(&self.name);
        }
        self
    }

    pub fn with_context_root(mut self, root: &str) -> Self {
        self.set_context_root(root);
        self
    }

    pub fn into_shared(self) -> SharedDeployment {
        Arc::new(RwLock::new(self))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn context_root(&self) -> &str {
        &self.context_root
    }

    pub fn set_context_root(&mut self, root: &str) {
        self.context_root = normalize_context_root(root);
    }

    pub fn source(&self) -> Option<&DeploymentSource> {
        self.source.as_ref()
    }

    /// Assign or clear the source location. Clearing retracts verification.
    pub fn set_location(&mut self, source: Option<DeploymentSource>) {
        self.source = source;
    }

    pub fn content_manifest(&self) -> Option<&ContentManifest> {
        self.manifest.as_ref()
    }

    pub fn set_content_manifest(&mut self, manifest: ContentManifest) {
        self.manifest = Some(manifest);
    }

    pub fn class_loader(&self) -> Option<&Arc<dyn ClassLoader>> {
        self.class_loader.as_ref()
    }

    pub fn set_class_loader(&mut self, loader: Arc<dyn ClassLoader>) {
        self.class_loader = Some(loader);
    }

    pub fn specifications(&self) -> Option<&BTreeSet<Specification>> {
        self.specifications.as_ref()
    }

    pub fn set_specifications(&mut self, specifications: BTreeSet<Specification>) {
        self.specifications = Some(specifications);
    }

    pub fn sniffers(&self) -> Option<&[SnifferReport]> {
        self.sniffers.as_deref()
    }

    pub fn set_sniffers(&mut self, sniffers: Vec<SnifferReport>) {
        self.sniffers = Some(sniffers);
    }

    pub fn module(&self) -> Option<&Arc<dyn Module>> {
        self.module.as_ref()
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_ref().map(|m| m.name())
    }

    pub fn set_module(&mut self, module: Arc<dyn Module>) {
        self.module = Some(module);
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Merge metadata, later values replacing earlier ones
    pub fn merge_metadata(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        self.metadata.extend(entries);
    }

    pub fn exception(&self) -> Option<&DeploymentFailure> {
        self.exception.as_ref()
    }

    pub fn has_failed(&self) -> bool {
        self.exception.is_some()
    }

    /// Record a registration failure. A failed deployment never becomes
    /// deployed or ready afterwards.
    pub fn record_failure(&mut self, module: Option<&str>, message: impl Into<String>) {
        self.exception = Some(DeploymentFailure {
            module: module.map(str::to_string),
            message: message.into(),
            occurred_at: Utc::now(),
        });
        self.registered = false;
        self.ready = false;
    }

    fn missing_preparation(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.manifest.is_none() {
            missing.push("content manifest");
        }
        if self.class_loader.is_none() {
            missing.push("class loader");
        }
        if self.specifications.is_none() {
            missing.push("specifications");
        }
        if self.sniffers.is_none() {
            missing.push("sniffers");
        }
        if self.module.is_none() {
            missing.push("module");
        }
        missing
    }

    fn facts(&self) -> PhaseFacts {
        PhaseFacts {
            verified: self.source.is_some(),
            prepared: self.missing_preparation().is_empty(),
            registered: self.registered,
            failed: self.exception.is_some(),
            ready: self.ready,
        }
    }

    pub fn phase(&self) -> DeploymentPhase {
        DeploymentPhase::resolve(self.facts())
    }

    fn ensure_phase(
        &self,
        operation: &'static str,
        allowed: impl Fn(DeploymentPhase) -> bool,
    ) -> DeploymentResult<()> {
        let phase = self.phase();
        if phase == DeploymentPhase::Verified {
            let missing = self.missing_preparation();
            if !missing.is_empty() {
                return Err(DeploymentError::NotPrepared {
                    name: self.name.clone(),
                    missing,
                });
            }
        }
        if !allowed(phase) {
            return Err(DeploymentError::InvalidPhase {
                name: self.name.clone(),
                phase: phase.to_string(),
                operation,
            });
        }
        Ok(())
    }

    /// Claim the deployment for one deploy run. Rejected while another run
    /// holds it and once it has failed or been deployed.
    pub fn begin_deploy(&mut self) -> DeploymentResult<()> {
        let phase = self.phase();
        if self.deploying || self.has_failed() || phase.is_deployed() {
            return Err(DeploymentError::InvalidPhase {
                name: self.name.clone(),
                phase: if self.deploying {
                    "deploying".to_string()
                } else {
                    phase.to_string()
                },
                operation: "deploy",
            });
        }
        self.deploying = true;
        Ok(())
    }

    /// Release the claim taken by [`begin_deploy`](Self::begin_deploy)
    pub fn end_deploy(&mut self) {
        self.deploying = false;
    }

    pub fn is_deploying(&self) -> bool {
        self.deploying
    }

    /// Record successful registration by the owning module
    pub fn mark_deployed(&mut self) -> DeploymentResult<()> {
        self.ensure_phase("deploy", |p| p == DeploymentPhase::Prepared)?;
        self.registered = true;
        Ok(())
    }

    /// Record that the application can serve requests
    pub fn mark_ready(&mut self) -> DeploymentResult<()> {
        self.ensure_phase("become ready", |p| p.is_deployed())?;
        self.ready = true;
        Ok(())
    }
}

impl fmt::Debug for ArchiveDeployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveDeployment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("context_root", &self.context_root)
            .field("source", &self.source)
            .field("phase", &self.phase())
            .field("module", &self.module_name())
            .field("specifications", &self.specifications)
            .field("exception", &self.exception)
            .finish()
    }
}
