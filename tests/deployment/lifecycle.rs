//! Phase progression of a single deployment through the deployer.

use crate::common::archives::html_war;
use harbor_core::constants::metadata;
use harbor_core::deployer::{Deployer, DeploymentOutcome};
use harbor_core::deployment::{ArchiveDeployment, DeploymentError, RunData};
use harbor_core::events::EventBus;
use harbor_core::module::{Module, StaticContentModule};
use harbor_core::registry::SnifferRegistry;
use harbor_core::state_machine::DeploymentPhase;
use std::sync::Arc;

fn static_deployer() -> (Deployer, Arc<StaticContentModule>) {
    let module = Arc::new(StaticContentModule::new());
    let deployer = Deployer::new(
        vec![module.clone() as Arc<dyn Module>],
        Arc::new(SnifferRegistry::with_builtin()),
        Arc::new(RunData::new()),
    );
    (deployer, module)
}

#[test]
fn test_expanded_site_moves_through_every_phase() {
    let dir = tempfile::tempdir().unwrap();
    let root = html_war().write_expanded(dir.path(), "ROOT");
    let (deployer, module) = static_deployer();
    let bus = EventBus::new();

    let deployment = ArchiveDeployment::from_expanded(&root).into_shared();
    assert_eq!(deployment.read().phase(), DeploymentPhase::Verified);
    assert_eq!(deployment.read().context_root(), "/");

    // Not deployed yet
    let early = deployer.signal_ready(&deployment).unwrap_err();
    assert!(matches!(early, DeploymentError::NotPrepared { .. }));

    let outcome = deployer.deploy(&deployment, &bus).unwrap();
    assert_eq!(outcome, DeploymentOutcome::Deployed);
    assert_eq!(deployment.read().phase(), DeploymentPhase::Deployed);
    assert_eq!(
        deployment.read().metadata_value(metadata::HTML_WELCOME_FILE),
        Some("index.html")
    );
    assert_eq!(
        deployment.read().metadata_value(metadata::STATIC_CONTENT_PAGES),
        Some("2")
    );
    assert_eq!(
        module.index().resolve("/about.html").map(|(root, _)| root),
        Some("/".to_string())
    );

    deployer.signal_ready(&deployment).unwrap();
    assert_eq!(deployment.read().phase(), DeploymentPhase::Ready);
    assert!(deployment.read().phase().is_terminal());

    let again = deployer.deploy(&deployment, &bus).unwrap_err();
    assert!(matches!(again, DeploymentError::InvalidPhase { .. }));
}

#[test]
fn test_verify_retracts_a_vanished_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = html_war().write_war(dir.path(), "site.war");
    let (deployer, _) = static_deployer();
    let bus = EventBus::new();

    let deployment = ArchiveDeployment::from_archive(&path).into_shared();
    deployer.deploy(&deployment, &bus).unwrap();
    assert!(deployer.verify(&deployment));

    std::fs::remove_file(&path).unwrap();
    assert!(!deployer.verify(&deployment));
    assert_eq!(deployment.read().phase(), DeploymentPhase::NotStarted);
    assert!(deployment.read().source().is_none());
}

#[test]
fn test_undeploy_releases_context_root() {
    let dir = tempfile::tempdir().unwrap();
    let (deployer, module) = static_deployer();
    let bus = EventBus::new();

    let first = ArchiveDeployment::from_archive(html_war().write_war(dir.path(), "a.war"))
        .with_context_root("/site")
        .into_shared();
    let second = ArchiveDeployment::from_archive(html_war().write_war(dir.path(), "b.war"))
        .with_context_root("site/")
        .into_shared();

    assert_eq!(deployer.deploy(&first, &bus).unwrap(), DeploymentOutcome::Deployed);
    // Same normalized root: the module refuses it
    assert_eq!(deployer.deploy(&second, &bus).unwrap(), DeploymentOutcome::Failed);
    assert_eq!(deployer.run_data().len(), 1);

    assert!(deployer.undeploy(&first));
    assert!(!deployer.undeploy(&first));
    assert!(module.index().pages("/site").is_none());
    assert!(deployer.run_data().is_empty());
}
