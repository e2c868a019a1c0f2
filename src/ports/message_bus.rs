//! MessageBus port - Boundary to the external message transport.
//!
//! The dispatcher hands reconstructed events to this port; everything past
//! it (broker, queue, pub/sub channel) is someone else's problem. Delivery
//! through this port is at-least-once: a crash between a successful
//! `publish` and the outbox mark re-publishes the event on the next cycle,
//! so downstream consumers must be idempotent.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing events to the external bus.
///
/// Cancellation is cooperative: the dispatcher drops the in-flight future
/// when it is shut down mid-publish, and the outbox row stays pending.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
