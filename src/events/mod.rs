pub mod bus;
pub mod types;

// Re-export key types for convenience
pub use bus::{EventBus, EventBusStats, EventError, EventListener};
pub use types::{Event, EventPayload};
