//! # Runtime Object Registry
//!
//! Typed lookup of objects that modules expose to each other. Keys are
//! derived from the Rust type (`RuntimeObjectKey::of::<T>()`), values are
//! `Arc<T>` stored behind `dyn Any` and downcast on lookup, so `T` may be a
//! trait object.
//!
//! A module's exposed types are bound to it when it completes starting and
//! released when it stops. Lookups go back to the providing module, which
//! hands out its current object. The runtime itself can also publish
//! objects it owns directly.

use crate::module::Module;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type-erased `Arc<T>`
pub type RuntimeObject = Arc<dyn Any + Send + Sync>;

/// Wrap `value` for storage in the registry
pub fn runtime_object<T>(value: Arc<T>) -> RuntimeObject
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeObjectKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl RuntimeObjectKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for RuntimeObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

enum Provider {
    Module(Arc<dyn Module>),
    Object { owner: String, object: RuntimeObject },
}

impl Provider {
    fn owner(&self) -> &str {
        match self {
            Self::Module(module) => module.name(),
            Self::Object { owner, .. } => owner,
        }
    }
}

#[derive(Default)]
pub struct RuntimeObjectRegistry {
    providers: DashMap<RuntimeObjectKey, Provider>,
}

impl RuntimeObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every type `module` exposes to it. A type already bound to
    /// another provider is rebound and the replacement logged.
    pub fn register_module(&self, module: &Arc<dyn Module>) -> usize {
        let keys = module.exposed_runtime_object_types();
        for key in &keys {
            if let Some(previous) = self
                .providers
                .insert(*key, Provider::Module(Arc::clone(module)))
            {
                warn!(
                    object_type = key.type_name(),
                    previous = previous.owner(),
                    module = module.name(),
                    "Runtime object provider replaced"
                );
            }
        }
        if !keys.is_empty() {
            debug!(module = module.name(), exposed = ?keys, "Runtime objects registered");
        }
        keys.len()
    }

    /// Release every binding owned by `name`
    pub fn unregister_module(&self, name: &str) -> usize {
        let before = self.providers.len();
        self.providers.retain(|_, provider| provider.owner() != name);
        before - self.providers.len()
    }

    /// Publish an object owned by the runtime rather than a module
    pub fn insert_object<T>(&self, owner: impl Into<String>, value: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.providers.insert(
            RuntimeObjectKey::of::<T>(),
            Provider::Object {
                owner: owner.into(),
                object: runtime_object(value),
            },
        );
    }

    /// Name of the module (or owner) providing `key`
    pub fn provider(&self, key: &RuntimeObjectKey) -> Option<String> {
        self.providers.get(key).map(|p| p.owner().to_string())
    }

    pub fn lookup_raw(&self, key: &RuntimeObjectKey) -> Option<RuntimeObject> {
        // Clone the provider out so the module is not called under the map lock
        let module = match self.providers.get(key)?.value() {
            Provider::Object { object, .. } => return Some(Arc::clone(object)),
            Provider::Module(module) => Arc::clone(module),
        };
        module.get_runtime_object(key)
    }

    pub fn lookup<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let object = self.lookup_raw(&RuntimeObjectKey::of::<T>())?;
        match object.downcast_ref::<Arc<T>>() {
            Some(value) => Some(Arc::clone(value)),
            None => {
                warn!(
                    object_type = std::any::type_name::<T>(),
                    "Runtime object has unexpected type"
                );
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for RuntimeObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.providers.iter() {
            map.entry(entry.key(), &entry.value().owner());
        }
        map.finish()
    }
}
