//! # Deployer
//!
//! Turns a deployment request into a running application:
//!
//! 1. Read the content manifest and open a class loader for the source,
//!    unless the deployment already carries them.
//! 2. Classify the content with fresh sniffers for the active modules.
//! 3. Pick the first active module, in registration order, serving one of
//!    the detected specifications. With no match the deployment is dropped
//!    silently: no events, nothing recorded.
//! 4. Record the preparation inputs, publish the pre-deployment event and
//!    hand the deployment to the module.
//! 5. On success mark it deployed and add it to [`RunData`]; on failure
//!    record the error on the deployment. The post-deployment event is
//!    published either way.
//!
//! No deployment lock is held while events are published, so listeners can
//! read the deployment they receive. A deployment is claimed for the whole
//! run, so a second request for it is rejected until the first completes.

use crate::classifier::{ArchiveClassLoader, ClassLoader, ClassificationResult, SpecificationClassifier};
use crate::constants::events;
use crate::deployment::{
    ContentManifest, DeploymentContext, DeploymentError, DeploymentResult, RunData,
    SharedDeployment,
};
use crate::error::run_hook;
use crate::events::{Event, EventBus, EventError, EventListener};
use crate::logging::log_deployment_operation;
use crate::module::Module;
use crate::registry::{first_serving, SnifferRegistry};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LISTENER_NAME: &str = "deployer";

/// How a deployment request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentOutcome {
    /// Registered by its module and added to the running applications
    Deployed,
    /// The module rejected it; the failure is recorded on the deployment
    Failed,
    /// No active module serves what the content needs
    Unmatched,
}

impl fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deployed => "deployed",
            Self::Failed => "failed",
            Self::Unmatched => "unmatched",
        })
    }
}

/// Releases the deploy claim when the run ends, on every return path
struct DeployClaim<'a>(&'a SharedDeployment);

impl Drop for DeployClaim<'_> {
    fn drop(&mut self) {
        self.0.write().end_deploy();
    }
}

pub struct Deployer {
    modules: Vec<Arc<dyn Module>>,
    sniffers: Arc<SnifferRegistry>,
    run_data: Arc<RunData>,
    classifier: SpecificationClassifier,
}

impl Deployer {
    /// `modules` are the active modules in registration order
    pub fn new(
        modules: Vec<Arc<dyn Module>>,
        sniffers: Arc<SnifferRegistry>,
        run_data: Arc<RunData>,
    ) -> Self {
        Self {
            modules,
            sniffers,
            run_data,
            classifier: SpecificationClassifier::new(),
        }
    }

    pub fn run_data(&self) -> &Arc<RunData> {
        &self.run_data
    }

    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// First module, in registration order, serving a detected specification
    pub fn select_module(&self, classification: &ClassificationResult) -> Option<Arc<dyn Module>> {
        first_serving(&self.modules, &classification.specifications).cloned()
    }

    /// Classify the deployment's content against the active modules'
    /// sniffers without changing the deployment.
    pub fn classify(&self, deployment: &SharedDeployment) -> DeploymentResult<ClassificationResult> {
        let (manifest, loader) = self.load_content(deployment)?;
        Ok(self.run_classifier(&manifest, loader.as_ref()))
    }

    pub fn deploy(
        &self,
        deployment: &SharedDeployment,
        bus: &EventBus,
    ) -> DeploymentResult<DeploymentOutcome> {
        let (name, context_root) = {
            let mut current = deployment.write();
            current.begin_deploy()?;
            (current.name().to_string(), current.context_root().to_string())
        };
        let _claim = DeployClaim(deployment);

        let (manifest, loader) = match self.load_content(deployment) {
            Ok(content) => content,
            Err(error) => {
                warn!(deployment = %name, error = %error, "Deployment content unreadable");
                deployment.write().record_failure(None, error.to_string());
                log_deployment_operation("deploy", &name, Some(&context_root), "failed", Some(&error.to_string()));
                return Err(error);
            }
        };

        let classification = self.run_classifier(&manifest, loader.as_ref());
        let Some(module) = self.select_module(&classification) else {
            info!(
                deployment = %name,
                specifications = ?classification.specifications,
                "No module serves this deployment"
            );
            log_deployment_operation("deploy", &name, Some(&context_root), "unmatched", None);
            return Ok(DeploymentOutcome::Unmatched);
        };

        {
            let mut prepared = deployment.write();
            prepared.set_content_manifest(manifest);
            prepared.set_class_loader(loader);
            prepared.set_specifications(classification.specifications);
            prepared.merge_metadata(classification.metadata);
            prepared.set_sniffers(classification.triggered);
            prepared.set_module(Arc::clone(&module));
        }
        debug!(deployment = %name, module = module.name(), "Deployment prepared");

        bus.publish_event(&Event::deployment(events::PRE_DEPLOYMENT, Arc::clone(deployment)));

        let outcome = {
            let mut target = deployment.write();
            let _scope = DeploymentContext::of(&target).enter();
            let registered = run_hook(|| module.register_deployment(&mut target))
                .and_then(|()| target.mark_deployed().map_err(|e| e.to_string()));
            match registered {
                Ok(()) => DeploymentOutcome::Deployed,
                Err(reason) => {
                    target.record_failure(Some(module.name()), reason);
                    DeploymentOutcome::Failed
                }
            }
        };

        let details = match outcome {
            DeploymentOutcome::Deployed => {
                self.run_data.add(Arc::clone(deployment));
                module.name().to_string()
            }
            _ => deployment
                .read()
                .exception()
                .map(ToString::to_string)
                .unwrap_or_default(),
        };
        log_deployment_operation(
            "deploy",
            &name,
            Some(&context_root),
            &outcome.to_string(),
            Some(&details),
        );

        bus.publish_event(&Event::deployment(events::POST_DEPLOYMENT, Arc::clone(deployment)));
        Ok(outcome)
    }

    /// Remove a deployment from the running applications and let its module
    /// release it. Returns whether it was running.
    pub fn undeploy(&self, deployment: &SharedDeployment) -> bool {
        let current = deployment.read();
        let was_running = self.run_data.remove(current.id()).is_some();

        if let Some(module) = current.module() {
            if let Err(reason) = run_hook(|| module.unregister_deployment(&current)) {
                warn!(
                    deployment = current.name(),
                    module = module.name(),
                    error = %reason,
                    "Module failed to release deployment"
                );
            }
        }

        log_deployment_operation(
            "undeploy",
            current.name(),
            Some(current.context_root()),
            if was_running { "undeployed" } else { "not_running" },
            None,
        );
        was_running
    }

    /// Check the deployment's source still exists; a missing source
    /// retracts verification.
    pub fn verify(&self, deployment: &SharedDeployment) -> bool {
        let mut current = deployment.write();
        let Some(source) = current.source() else {
            return false;
        };
        if source.exists() {
            return true;
        }

        warn!(
            deployment = current.name(),
            path = %source.path().display(),
            "Deployment source is gone"
        );
        current.set_location(None);
        false
    }

    /// Record that a deployed application is serving requests
    pub fn signal_ready(&self, deployment: &SharedDeployment) -> DeploymentResult<()> {
        let mut current = deployment.write();
        current.mark_ready()?;
        log_deployment_operation("ready", current.name(), Some(current.context_root()), "ready", None);
        Ok(())
    }

    fn load_content(
        &self,
        deployment: &SharedDeployment,
    ) -> DeploymentResult<(ContentManifest, Arc<dyn ClassLoader>)> {
        let (name, source, manifest, loader) = {
            let current = deployment.read();
            (
                current.name().to_string(),
                current.source().cloned(),
                current.content_manifest().cloned(),
                current.class_loader().cloned(),
            )
        };

        if let (Some(manifest), Some(loader)) = (&manifest, &loader) {
            return Ok((manifest.clone(), Arc::clone(loader)));
        }

        let source = source.ok_or(DeploymentError::NoSource { name })?;
        if !source.exists() {
            return Err(DeploymentError::SourceMissing(source.path().to_path_buf()));
        }

        let manifest = match manifest {
            Some(manifest) => manifest,
            None => ContentManifest::read(source.path())?,
        };
        let loader = match loader {
            Some(loader) => loader,
            None => Arc::new(ArchiveClassLoader::open(source.path())?) as Arc<dyn ClassLoader>,
        };
        Ok((manifest, loader))
    }

    fn run_classifier(
        &self,
        manifest: &ContentManifest,
        loader: &dyn ClassLoader,
    ) -> ClassificationResult {
        let sniffers = self.sniffers.create_for_modules(&self.modules);
        self.classifier.classify(manifest, loader, sniffers)
    }
}

impl EventListener for Deployer {
    fn on_event(&self, event: &Event, bus: &EventBus) -> Result<(), EventError> {
        let code = event.code.as_str();
        if !matches!(
            code,
            events::DEPLOYMENT_REQUESTED | events::UNDEPLOYMENT | events::VERIFY_DEPLOYMENT
        ) {
            return Ok(());
        }

        let deployment = event
            .deployment_payload()
            .ok_or_else(|| EventError::UnexpectedPayload {
                code: event.code.clone(),
                expected: "deployment".to_string(),
            })?;

        match code {
            events::DEPLOYMENT_REQUESTED => self
                .deploy(deployment, bus)
                .map(|_| ())
                .map_err(|e| EventError::ListenerFailed {
                    listener: LISTENER_NAME.to_string(),
                    code: event.code.clone(),
                    reason: e.to_string(),
                }),
            events::UNDEPLOYMENT => {
                self.undeploy(deployment);
                Ok(())
            }
            _ => {
                self.verify(deployment);
                Ok(())
            }
        }
    }

    fn listener_name(&self) -> &str {
        LISTENER_NAME
    }
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("running", &self.run_data.len())
            .finish()
    }
}
