//! In-memory outbox store and manual clock.
//!
//! Deterministic implementations for unit and integration tests. The store
//! applies the same eligibility, ordering, and transition rules as the
//! Postgres adapter; the clock only moves when a test tells it to.
//!
//! Not for production use: every write lives in process memory and dies
//! with it, which is precisely what the outbox pattern exists to prevent.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope, Timestamp};
use crate::domain::outbox::OutboxMessage;
use crate::ports::{Clock, OutboxStore};

/// Clock that advances only on demand.
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, now: Timestamp) {
        *self.now.write().expect("ManualClock: lock poisoned") = now;
    }

    /// Advances the clock by whole minutes.
    pub fn advance_minutes(&self, minutes: u64) {
        let mut now = self.now.write().expect("ManualClock: lock poisoned");
        *now = now.plus_minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().expect("ManualClock: lock poisoned")
    }
}

/// In-memory implementation of the outbox store.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. Acceptable for test
/// code; production runs on the Postgres adapter.
pub struct InMemoryOutboxStore {
    clock: Arc<dyn Clock>,
    max_retries: u32,
    messages: RwLock<Vec<OutboxMessage>>,
}

impl InMemoryOutboxStore {
    /// Creates an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            max_retries: 5,
            messages: RwLock::new(Vec::new()),
        }
    }

    /// Overrides the retry cap used when pinning dead-lettered messages.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    // === Test Helpers ===

    /// Returns every stored message, oldest first.
    pub fn all_messages(&self) -> Vec<OutboxMessage> {
        let mut messages = self
            .messages
            .read()
            .expect("InMemoryOutboxStore: lock poisoned")
            .clone();
        messages.sort_by_key(|m| m.occurred_on);
        messages
    }

    /// Returns the number of stored messages.
    pub fn message_count(&self) -> usize {
        self.messages
            .read()
            .expect("InMemoryOutboxStore: lock poisoned")
            .len()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn add_event(
        &self,
        event: &EventEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<OutboxMessage, DomainError> {
        let message = OutboxMessage::from_envelope(event, correlation_id);
        self.messages
            .write()
            .expect("InMemoryOutboxStore: lock poisoned")
            .push(message.clone());

        tracing::debug!(
            message_id = %message.id,
            event_type = %message.event_type,
            "outbox message added"
        );
        Ok(message)
    }

    async fn get_unprocessed(&self, batch_size: u32) -> Result<Vec<OutboxMessage>, DomainError> {
        let now = self.clock.now();
        let mut due: Vec<OutboxMessage> = self
            .messages
            .read()
            .expect("InMemoryOutboxStore: lock poisoned")
            .iter()
            .filter(|m| m.is_due(now))
            .cloned()
            .collect();

        due.sort_by_key(|m| m.occurred_on);
        due.truncate(batch_size as usize);
        Ok(due)
    }

    async fn mark_processed(&self, id: Uuid, at: Timestamp) -> Result<(), DomainError> {
        let mut messages = self
            .messages
            .write()
            .expect("InMemoryOutboxStore: lock poisoned");
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.mark_processed(at);
                tracing::info!(message_id = %id, "outbox message processed");
            }
            None => tracing::warn!(message_id = %id, "outbox message not found"),
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, at: Timestamp) -> Result<(), DomainError> {
        let mut messages = self
            .messages
            .write()
            .expect("InMemoryOutboxStore: lock poisoned");
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.mark_failed(error, at);
                tracing::warn!(
                    message_id = %id,
                    retry_count = message.retry_count,
                    error = %error,
                    "outbox message failed"
                );
            }
            None => tracing::warn!(message_id = %id, "outbox message not found"),
        }
        Ok(())
    }

    async fn mark_dead_letter(
        &self,
        id: Uuid,
        error: &str,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut messages = self
            .messages
            .write()
            .expect("InMemoryOutboxStore: lock poisoned");
        match messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.mark_dead_letter(error, at, self.max_retries);
                tracing::error!(
                    message_id = %id,
                    retry_count = message.retry_count,
                    error = %error,
                    "outbox message dead-lettered"
                );
            }
            None => tracing::warn!(message_id = %id, "outbox message not found"),
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OutboxMessage>, DomainError> {
        Ok(self
            .messages
            .read()
            .expect("InMemoryOutboxStore: lock poisoned")
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn cleanup_processed(&self, older_than: Duration) -> Result<u64, DomainError> {
        let cutoff = self.clock.now();
        let cutoff = Timestamp::from_datetime(
            *cutoff.as_datetime() - chrono::Duration::from_std(older_than).unwrap_or_default(),
        );

        let mut messages = self
            .messages
            .write()
            .expect("InMemoryOutboxStore: lock poisoned");
        let before = messages.len();
        messages.retain(|m| match m.processed_on {
            Some(processed_on) => processed_on > cutoff,
            None => true,
        });
        let deleted = (before - messages.len()) as u64;

        tracing::info!(deleted, "cleaned up processed outbox messages");
        Ok(deleted)
    }
}
