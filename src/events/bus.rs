//! # Event Bus
//!
//! Process-wide publish/subscribe facility. Publishing is synchronous: every
//! listener registered at publish time is invoked on the publishing thread,
//! in registration order, before `publish` returns.
//!
//! The listener list is snapshotted before delivery, so listeners may publish
//! further events (the deployer publishes pre/post-deployment events while
//! handling a deployment request) and may register or unregister listeners
//! without deadlocking. A failing or panicking listener is logged and skipped;
//! delivery continues with the next one.

use super::types::{Event, EventPayload};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Error types for event delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Listener {listener} failed handling {code}: {reason}")]
    ListenerFailed {
        listener: String,
        code: String,
        reason: String,
    },
    #[error("Event {code} carried an unexpected payload, expected {expected}")]
    UnexpectedPayload { code: String, expected: String },
}

/// Receives events published on an [`EventBus`].
///
/// The bus is passed in so a listener can publish follow-up events without
/// holding its own reference to the bus.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &Event, bus: &EventBus) -> Result<(), EventError>;

    /// Get listener name for identification in logs
    fn listener_name(&self) -> &str {
        "unnamed_listener"
    }
}

/// Delivery statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    pub deliveries: u64,
    pub listener_failures: u64,
}

#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
    events_published: AtomicU64,
    deliveries: AtomicU64,
    listener_failures: AtomicU64,
}

fn same_listener(a: &Arc<dyn EventListener>, b: &Arc<dyn EventListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same listener twice is a no-op;
    /// returns whether the listener was added.
    pub fn register(&self, listener: Arc<dyn EventListener>) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        debug!(listener = listener.listener_name(), "Registered event listener");
        listeners.push(listener);
        true
    }

    /// Unregister a listener; returns whether it was registered.
    pub fn unregister(&self, listener: &Arc<dyn EventListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        let removed = listeners.len() != before;
        if removed {
            debug!(listener = listener.listener_name(), "Unregistered event listener");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Publish an event with the given code and payload, returning the number
    /// of listeners that handled it without error.
    pub fn publish(&self, code: impl Into<String>, payload: EventPayload) -> usize {
        self.publish_event(&Event::new(code, payload))
    }

    /// Deliver `event` to every currently registered listener.
    pub fn publish_event(&self, event: &Event) -> usize {
        let listeners: Vec<Arc<dyn EventListener>> = self.listeners.read().clone();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0;
        for listener in &listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event, self)));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(error)) => {
                    self.listener_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        listener = listener.listener_name(),
                        code = %event.code,
                        error = %error,
                        "Event listener failed"
                    );
                }
                Err(_) => {
                    self.listener_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        listener = listener.listener_name(),
                        code = %event.code,
                        "Event listener panicked"
                    );
                }
            }
        }

        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        debug!(
            code = %event.code,
            listeners = listeners.len(),
            delivered,
            "Event published"
        );
        delivered
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            events_published: self.events_published.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .field("stats", &self.stats())
            .finish()
    }
}
