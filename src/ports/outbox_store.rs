//! OutboxStore port - Durable CRUD surface over outbox messages.
//!
//! This port is the storage half of the Transactional Outbox Pattern:
//!
//! 1. Commit-time capture writes events to the outbox in the same
//!    transaction as the aggregate changes
//! 2. The dispatcher polls for due messages and publishes them
//! 3. Each message is driven to Processed or DeadLetter
//!
//! Any storage technology is acceptable as long as `add_event` participates
//! in the same transaction as the entity save. The Postgres adapter exposes
//! an explicit in-transaction variant for command handlers; the in-memory
//! adapter is trivially atomic per call.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope, Timestamp};
use crate::domain::outbox::OutboxMessage;

/// Port for the durable outbox table.
///
/// Mutation methods follow the original store semantics: marking a message
/// that no longer exists logs a warning and returns `Ok` rather than
/// failing the whole batch.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Inserts a new pending message for an event.
    ///
    /// Must be called within the same transaction as the entity changes
    /// that raised the event.
    async fn add_event(
        &self,
        event: &EventEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<OutboxMessage, DomainError>;

    /// Returns up to `batch_size` messages eligible for dispatch
    /// (unprocessed and past any scheduled retry time), oldest first.
    async fn get_unprocessed(&self, batch_size: u32) -> Result<Vec<OutboxMessage>, DomainError>;

    /// Marks a message as successfully delivered.
    async fn mark_processed(&self, id: Uuid, at: Timestamp) -> Result<(), DomainError>;

    /// Records a failed delivery attempt and schedules the retry.
    async fn mark_failed(&self, id: Uuid, error: &str, at: Timestamp) -> Result<(), DomainError>;

    /// Permanently fails a message that exhausted its retry budget.
    async fn mark_dead_letter(
        &self,
        id: Uuid,
        error: &str,
        at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Fetches a single message by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<OutboxMessage>, DomainError>;

    /// Deletes processed messages older than the cutoff.
    ///
    /// Unprocessed rows are never deleted, regardless of age. Returns the
    /// number of rows removed.
    async fn cleanup_processed(&self, older_than: Duration) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn OutboxStore) {}
}
