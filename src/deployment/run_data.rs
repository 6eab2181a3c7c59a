use super::archive::SharedDeployment;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Registry of running applications.
///
/// Only deployments that were registered successfully are added. A single
/// lock guards mutation; classification never runs under it.
#[derive(Debug, Default)]
pub struct RunData {
    // Ids are immutable, so they are kept beside each entry
    deployments: Mutex<Vec<(Uuid, SharedDeployment)>>,
}

impl RunData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a deployment; returns false if one with the same id is present
    pub fn add(&self, deployment: SharedDeployment) -> bool {
        let id = deployment.read().id();
        let mut deployments = self.deployments.lock();
        if deployments.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        deployments.push((id, deployment));
        true
    }

    pub fn remove(&self, id: Uuid) -> Option<SharedDeployment> {
        let mut deployments = self.deployments.lock();
        let index = deployments.iter().position(|(existing, _)| *existing == id)?;
        Some(deployments.remove(index).1)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.deployments
            .lock()
            .iter()
            .any(|(existing, _)| *existing == id)
    }

    pub fn by_name(&self, name: &str) -> Option<SharedDeployment> {
        self.deployments
            .lock()
            .iter()
            .find(|(_, d)| d.read().name() == name)
            .map(|(_, d)| Arc::clone(d))
    }

    pub fn by_context_root(&self, root: &str) -> Option<SharedDeployment> {
        self.deployments
            .lock()
            .iter()
            .find(|(_, d)| d.read().context_root() == root)
            .map(|(_, d)| Arc::clone(d))
    }

    pub fn names(&self) -> Vec<String> {
        self.deployments
            .lock()
            .iter()
            .map(|(_, d)| d.read().name().to_string())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<SharedDeployment> {
        self.deployments
            .lock()
            .iter()
            .map(|(_, d)| Arc::clone(d))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deployments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.lock().is_empty()
    }
}
