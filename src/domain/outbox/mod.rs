//! Outbox message entity and event type registry.

mod message;
mod registry;

pub use message::{OutboxMessage, OutboxStatus};
pub use registry::EventTypeRegistry;
