use super::errors::{RegistryError, RegistryResult};
use crate::classifier::Specification;
use crate::module::Module;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Modules known to a runtime instance, in registration order.
///
/// Built once at configuration time; the scheduler and the deployer only
/// read from it afterwards.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Arc<dyn Module>) -> RegistryResult<()> {
        let name = module.name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidModuleName {
                name,
                reason: "name cannot be empty".to_string(),
            });
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateModule(name));
        }

        debug!(
            module = %name,
            dependencies = ?module.dependencies(),
            "Registered module"
        );
        self.index.insert(name, self.modules.len());
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registration position, used to keep scheduling deterministic
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// First of `modules`, in the order given, serving any of `specifications`
pub fn first_serving<'a>(
    modules: impl IntoIterator<Item = &'a Arc<dyn Module>>,
    specifications: &BTreeSet<Specification>,
) -> Option<&'a Arc<dyn Module>> {
    modules.into_iter().find(|m| {
        m.provided_specifications()
            .iter()
            .any(|s| specifications.contains(s))
    })
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}
