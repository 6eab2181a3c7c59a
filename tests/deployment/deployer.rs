//! Deployment pipeline: module selection, pre/post events, failure handling.

use crate::common::archives::{html_war, rest_war, servlet_war};
use crate::common::listeners::{attach, RecordingListener};
use crate::common::modules::{event_log, EventLog, RecordingModule};
use harbor_core::classifier::Specification;
use harbor_core::constants::{events, metadata, sniffers};
use harbor_core::deployer::{Deployer, DeploymentOutcome};
use harbor_core::deployment::{ArchiveDeployment, DeploymentError, RunData, SharedDeployment};
use harbor_core::events::{Event, EventBus, EventError, EventListener};
use harbor_core::module::{Module, StaticContentModule};
use harbor_core::registry::SnifferRegistry;
use harbor_core::state_machine::DeploymentPhase;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    deployer: Arc<Deployer>,
    bus: EventBus,
    run_data: Arc<RunData>,
    observer: Arc<RecordingListener>,
}

fn harness(modules: Vec<Arc<dyn Module>>) -> Harness {
    let run_data = Arc::new(RunData::new());
    let deployer = Arc::new(Deployer::new(
        modules,
        Arc::new(SnifferRegistry::with_builtin()),
        Arc::clone(&run_data),
    ));
    let bus = EventBus::new();
    let observer = RecordingListener::filtered("observer", &["deployment.pre", "deployment.post"]);
    attach(&bus, &observer);
    Harness {
        deployer,
        bus,
        run_data,
        observer,
    }
}

fn rest_module(log: &EventLog) -> RecordingModule {
    RecordingModule::new("rest-module", log).serving(Specification::Rest, sniffers::REST)
}

fn servlet_module(log: &EventLog) -> RecordingModule {
    RecordingModule::new("servlet-module", log).serving(Specification::Servlet, sniffers::SERVLET)
}

fn war(dir: &TempDir, name: &str, content: crate::common::archives::WarContent) -> SharedDeployment {
    ArchiveDeployment::from_archive(content.write_war(dir.path(), name)).into_shared()
}

#[test]
fn test_rest_archive_deploys_to_rest_module() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![servlet_module(&log).shared(), rest_module(&log).shared()]);
    let deployment = war(&dir, "orders.war", rest_war());

    let outcome = h.deployer.deploy(&deployment, &h.bus).unwrap();
    assert_eq!(outcome, DeploymentOutcome::Deployed);

    let deployed = deployment.read();
    assert_eq!(deployed.name(), "orders");
    assert_eq!(deployed.context_root(), "/orders");
    assert_eq!(deployed.phase(), DeploymentPhase::Deployed);
    assert_eq!(deployed.module_name(), Some("rest-module"));
    assert!(deployed
        .specifications()
        .is_some_and(|specs| specs.contains(&Specification::Rest)));
    assert_eq!(
        deployed.metadata_value(metadata::REST_APPLICATION_PATH),
        Some("/api")
    );
    assert_eq!(
        deployed.metadata_value(metadata::REST_RESOURCES),
        Some("com.example.Orders")
    );
    assert!(h.run_data.contains(deployed.id()));
    assert_eq!(log.lock().as_slice(), &["rest-module register orders".to_string()]);
}

#[test]
fn test_no_serving_module_leaves_deployment_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![servlet_module(&log).shared()]);
    let deployment = war(&dir, "orders.war", rest_war());

    let outcome = h.deployer.deploy(&deployment, &h.bus).unwrap();
    assert_eq!(outcome, DeploymentOutcome::Unmatched);

    assert!(h.observer.seen().is_empty());
    assert!(h.run_data.is_empty());
    let current = deployment.read();
    assert_eq!(current.phase(), DeploymentPhase::Verified);
    assert!(!current.has_failed());
    assert!(current.module().is_none());
    assert!(log.lock().is_empty());
}

#[test]
fn test_registration_failure_still_publishes_both_events() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![rest_module(&log).failing_registration().shared()]);
    let deployment = war(&dir, "orders.war", rest_war());

    let outcome = h.deployer.deploy(&deployment, &h.bus).unwrap();
    assert_eq!(outcome, DeploymentOutcome::Failed);

    assert_eq!(
        h.observer.codes(),
        vec![events::PRE_DEPLOYMENT.to_string(), events::POST_DEPLOYMENT.to_string()]
    );
    let current = deployment.read();
    assert!(current.has_failed());
    assert_eq!(current.phase(), DeploymentPhase::Failed);
    let failure = current.exception().expect("failure recorded");
    assert_eq!(failure.module.as_deref(), Some("rest-module"));
    assert!(failure.message.contains("rejected orders"));
    assert!(!h.run_data.contains(current.id()));
}

#[test]
fn test_first_registered_module_wins() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![
        RecordingModule::new("primary", &log)
            .serving(Specification::Rest, sniffers::REST)
            .shared(),
        RecordingModule::new("secondary", &log)
            .serving(Specification::Rest, sniffers::REST)
            .shared(),
    ]);
    let deployment = war(&dir, "orders.war", rest_war());

    h.deployer.deploy(&deployment, &h.bus).unwrap();
    assert_eq!(deployment.read().module_name(), Some("primary"));
}

/// Records the phase the deployment is in when each event arrives
struct PhaseProbe {
    phases: Mutex<Vec<(String, DeploymentPhase)>>,
}

impl EventListener for PhaseProbe {
    fn on_event(&self, event: &Event, _bus: &EventBus) -> Result<(), EventError> {
        if let Some(deployment) = event.deployment_payload() {
            self.phases
                .lock()
                .push((event.code.clone(), deployment.read().phase()));
        }
        Ok(())
    }
}

#[test]
fn test_pre_event_sees_prepared_and_post_sees_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![servlet_module(&log).shared()]);
    let probe = Arc::new(PhaseProbe {
        phases: Mutex::new(Vec::new()),
    });
    attach(&h.bus, &probe);
    let deployment = war(&dir, "hello.war", servlet_war());

    h.deployer.deploy(&deployment, &h.bus).unwrap();

    assert_eq!(
        probe.phases.lock().as_slice(),
        &[
            (events::PRE_DEPLOYMENT.to_string(), DeploymentPhase::Prepared),
            (events::POST_DEPLOYMENT.to_string(), DeploymentPhase::Deployed),
        ]
    );
}

#[test]
fn test_every_pre_event_has_a_post_event() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![
        servlet_module(&log).failing_registration().shared(),
        rest_module(&log).shared(),
    ]);

    let archives = [
        war(&dir, "a.war", rest_war()),
        war(&dir, "b.war", servlet_war()),
        war(&dir, "c.war", html_war()),
        war(&dir, "d.war", rest_war()),
    ];
    for deployment in &archives {
        h.deployer.deploy(deployment, &h.bus).unwrap();
    }

    let seen = h.observer.seen();
    assert_eq!(seen.len() % 2, 0);
    for pair in seen.chunks(2) {
        assert_eq!(pair[0].code, events::PRE_DEPLOYMENT);
        assert_eq!(pair[1].code, events::POST_DEPLOYMENT);
        assert_eq!(pair[0].deployment, pair[1].deployment);
    }
    // c.war is static content nobody here serves
    assert_eq!(h.observer.count(events::PRE_DEPLOYMENT), 3);
    assert_eq!(h.run_data.names(), vec!["a".to_string(), "d".to_string()]);
}

/// Deploys the deployment again from another thread while the first run is
/// between its pre and post events.
struct RedeployDuringPre {
    deployer: Arc<Deployer>,
    attempts: Mutex<Vec<Result<DeploymentOutcome, DeploymentError>>>,
}

impl EventListener for RedeployDuringPre {
    fn on_event(&self, event: &Event, bus: &EventBus) -> Result<(), EventError> {
        if event.code != events::PRE_DEPLOYMENT {
            return Ok(());
        }
        let Some(deployment) = event.deployment_payload() else {
            return Ok(());
        };
        let attempt = std::thread::scope(|s| {
            s.spawn(|| self.deployer.deploy(deployment, bus))
                .join()
                .unwrap()
        });
        self.attempts.lock().push(attempt);
        Ok(())
    }
}

#[test]
fn test_deployment_in_flight_cannot_be_deployed_again() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![rest_module(&log).shared()]);
    let racer = Arc::new(RedeployDuringPre {
        deployer: Arc::clone(&h.deployer),
        attempts: Mutex::new(Vec::new()),
    });
    attach(&h.bus, &racer);
    let deployment = war(&dir, "orders.war", rest_war());

    let outcome = h.deployer.deploy(&deployment, &h.bus).unwrap();

    assert_eq!(outcome, DeploymentOutcome::Deployed);
    let attempts = racer.attempts.lock();
    assert_eq!(attempts.len(), 1);
    match &attempts[0] {
        Err(DeploymentError::InvalidPhase { phase, .. }) => assert_eq!(phase, "deploying"),
        other => panic!("second deploy should be rejected, got {other:?}"),
    }

    let deployed = deployment.read();
    assert!(!deployed.has_failed());
    assert_eq!(deployed.phase(), DeploymentPhase::Deployed);
    assert!(h.run_data.contains(deployed.id()));
    assert_eq!(h.observer.count(events::PRE_DEPLOYMENT), 1);
    assert_eq!(h.observer.count(events::POST_DEPLOYMENT), 1);
    assert_eq!(
        log.lock()
            .iter()
            .filter(|entry| entry.as_str() == "rest-module register orders")
            .count(),
        1
    );
}

#[test]
fn test_missing_archive_records_failure() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(vec![Arc::new(StaticContentModule::new()) as Arc<dyn Module>]);
    let deployment = ArchiveDeployment::from_archive(dir.path().join("gone.war")).into_shared();

    let err = h.deployer.deploy(&deployment, &h.bus).unwrap_err();
    assert!(matches!(err, DeploymentError::SourceMissing(_)));
    assert!(deployment.read().has_failed());
    assert!(h.observer.seen().is_empty());

    let again = h.deployer.deploy(&deployment, &h.bus).unwrap_err();
    assert!(matches!(again, DeploymentError::InvalidPhase { .. }));
}

#[test]
fn test_deployment_without_source_is_rejected() {
    let h = harness(vec![]);
    let deployment = ArchiveDeployment::new("floating").into_shared();
    let err = h.deployer.deploy(&deployment, &h.bus).unwrap_err();
    assert!(matches!(err, DeploymentError::NoSource { ref name } if name == "floating"));
}

#[test]
fn test_deployment_requested_event_drives_the_deployer() {
    let dir = tempfile::tempdir().unwrap();
    let log = event_log();
    let h = harness(vec![rest_module(&log).shared()]);
    attach(&h.bus, &h.deployer);
    let deployment = war(&dir, "orders.war", rest_war());

    h.bus.publish_event(&Event::deployment(
        events::DEPLOYMENT_REQUESTED,
        Arc::clone(&deployment),
    ));
    assert!(deployment.read().phase().is_deployed());
    assert_eq!(h.observer.count(events::POST_DEPLOYMENT), 1);

    h.bus
        .publish_event(&Event::deployment(events::UNDEPLOYMENT, Arc::clone(&deployment)));
    assert!(h.run_data.is_empty());
    assert!(log
        .lock()
        .contains(&"rest-module unregister orders".to_string()));
}
