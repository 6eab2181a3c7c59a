use super::errors::{RegistryError, RegistryResult};
use crate::classifier::sniffers::{HtmlSniffer, RestSniffer, ServletSniffer};
use crate::classifier::Sniffer;
use crate::constants::sniffers;
use crate::module::Module;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

/// Creates a fresh sniffer for one classification run
pub type SnifferFactory = Arc<dyn Fn() -> Box<dyn Sniffer> + Send + Sync>;

/// Sniffer factories keyed by sniffer type.
///
/// Classification never shares sniffer instances: every run asks the
/// registry for new ones.
#[derive(Default)]
pub struct SnifferRegistry {
    factories: RwLock<Vec<(String, SnifferFactory)>>,
}

impl SnifferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the servlet, REST and HTML sniffers
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        let builtin: [(&str, SnifferFactory); 3] = [
            (sniffers::SERVLET, Arc::new(|| Box::new(ServletSniffer::new()) as Box<dyn Sniffer>)),
            (sniffers::REST, Arc::new(|| Box::new(RestSniffer::new()) as Box<dyn Sniffer>)),
            (sniffers::HTML, Arc::new(|| Box::new(HtmlSniffer::new()) as Box<dyn Sniffer>)),
        ];
        {
            let mut factories = registry.factories.write();
            for (name, factory) in builtin {
                factories.push((name.to_string(), factory));
            }
        }
        registry
    }

    pub fn register(&self, name: impl Into<String>, factory: SnifferFactory) -> RegistryResult<()> {
        let name = name.into();
        let mut factories = self.factories.write();
        if factories.iter().any(|(existing, _)| *existing == name) {
            return Err(RegistryError::DuplicateSniffer(name));
        }
        factories.push((name, factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.read().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Sniffer>> {
        let factory = self
            .factories
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| Arc::clone(f))?;
        Some(factory())
    }

    /// Fresh sniffers for the sniffer types declared by `modules`, one per
    /// type, in module order.
    pub fn create_for_modules(&self, modules: &[Arc<dyn Module>]) -> Vec<Box<dyn Sniffer>> {
        let mut seen: Vec<&str> = Vec::new();
        let mut created = Vec::new();
        for module in modules {
            let Some(kind) = module.sniffer_type() else {
                continue;
            };
            if seen.contains(&kind) {
                continue;
            }
            seen.push(kind);
            match self.create(kind) {
                Some(sniffer) => created.push(sniffer),
                None => warn!(
                    module = module.name(),
                    sniffer = kind,
                    "Module declares an unregistered sniffer type"
                ),
            }
        }
        created
    }
}

impl std::fmt::Debug for SnifferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnifferRegistry")
            .field("sniffers", &self.names())
            .finish()
    }
}
