//! Scoped "current deployment" for collaborator code that cannot be handed
//! the deployment explicitly.
//!
//! The deployer enters a scope around module registration; code running on
//! the same thread inside that call can read [`DeploymentContext::current`].
//! Scopes nest and are popped when the returned guard drops.

use super::archive::ArchiveDeployment;
use std::cell::RefCell;
use std::marker::PhantomData;
use uuid::Uuid;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<DeploymentContext>> = const { RefCell::new(Vec::new()) };
}

/// Immutable snapshot of the deployment being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentContext {
    pub id: Uuid,
    pub name: String,
    pub context_root: String,
}

impl DeploymentContext {
    pub fn of(deployment: &ArchiveDeployment) -> Self {
        Self {
            id: deployment.id(),
            name: deployment.name().to_string(),
            context_root: deployment.context_root().to_string(),
        }
    }

    /// Push this context for the current thread until the guard drops
    #[must_use = "the context is popped as soon as the scope guard is dropped"]
    pub fn enter(self) -> DeploymentScope {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(self));
        DeploymentScope {
            _not_send: PhantomData,
        }
    }

    pub fn current() -> Option<DeploymentContext> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
    }

    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

/// Guard returned by [`DeploymentContext::enter`]; bound to its thread
pub struct DeploymentScope {
    _not_send: PhantomData<*const ()>,
}

impl Drop for DeploymentScope {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
