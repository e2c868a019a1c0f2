//! In-process event handling ports.
//!
//! Some collaborators (audit logging, cache invalidation) want an event the
//! moment it is captured, on the committing task, rather than later via the
//! bus. These ports describe that synchronous, same-process path. It is
//! best-effort with respect to durability: the outbox row is the durable
//! record, the in-process notification is not.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Handler for processing domain events in-process.
///
/// Implementations should be:
/// - **Idempotent** - the same event may be seen more than once
/// - **Quick** - they run on the committing task
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process an event.
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Handler name for logging and error messages.
    fn name(&self) -> &'static str;
}

/// Port for registering in-process handlers.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe handler to a specific event type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Subscribe handler to multiple event types.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

/// Port for delivering a captured event to in-process subscribers.
///
/// Commit-time capture calls this after the outbox insert; an error
/// propagates and aborts the enclosing commit.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Synchronously deliver an event to all matching handlers.
    async fn notify(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
