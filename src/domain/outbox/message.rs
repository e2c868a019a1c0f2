//! Outbox message entity.
//!
//! A persisted "this event must eventually be published" record. The row is
//! created in the same transaction as the business mutation that raised the
//! event and is driven to a terminal state by the dispatcher:
//!
//! `Pending -> Processed` (delivered) |
//! `Pending -> Pending` (failed, retry scheduled) |
//! `Pending -> DeadLetter` (retry budget exhausted)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{EventEnvelope, Timestamp};

/// Delivery state derived from the row fields.
///
/// Dead-letter reuses `processed_on` to suppress further polling; it is
/// distinguished from a real success by `error`, which `mark_processed`
/// always clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Not yet delivered; eligible for dispatch once due.
    Pending,
    /// Delivered to the message bus.
    Processed,
    /// Retry budget exhausted; never polled again.
    DeadLetter,
}

/// A row in the outbox table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,

    /// Stable wire discriminator (e.g. "product.created.v1").
    pub event_type: String,

    /// Serialized JSON payload of the concrete event.
    pub content: String,

    /// Tracing key propagated from the originating request.
    pub correlation_id: Option<String>,

    /// When the event occurred; FIFO ordering key for dispatch.
    pub occurred_on: Timestamp,

    /// Set when the message reaches a terminal state (delivered OR
    /// dead-lettered); None while unresolved.
    pub processed_on: Option<Timestamp>,

    /// Last failure message.
    pub error: Option<String>,

    /// Number of failed delivery attempts.
    pub retry_count: u32,

    /// Earliest time a retry may be attempted; None means eligible now.
    pub next_retry_at: Option<Timestamp>,
}

impl OutboxMessage {
    /// Creates a pending message from an event envelope.
    ///
    /// The content is the envelope's payload alone: the concrete event
    /// struct carries its own id and timestamp, so the envelope can be
    /// reconstructed from `event_type` + `content` at dispatch time.
    pub fn from_envelope(envelope: &EventEnvelope, correlation_id: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: envelope.event_type.clone(),
            content: envelope.payload.to_string(),
            correlation_id: correlation_id.map(str::to_owned),
            occurred_on: envelope.occurred_at,
            processed_on: None,
            error: None,
            retry_count: 0,
            next_retry_at: None,
        }
    }

    /// True once the message has reached a terminal state.
    pub fn is_processed(&self) -> bool {
        self.processed_on.is_some()
    }

    /// True if at least one delivery attempt has failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// True if the message is eligible for dispatch at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.processed_on.is_none()
            && self.next_retry_at.map_or(true, |at| at <= now)
    }

    /// Derived delivery state.
    pub fn status(&self) -> OutboxStatus {
        match (&self.processed_on, &self.error) {
            (Some(_), Some(_)) => OutboxStatus::DeadLetter,
            (Some(_), None) => OutboxStatus::Processed,
            (None, _) => OutboxStatus::Pending,
        }
    }

    /// Marks the message as successfully delivered.
    pub fn mark_processed(&mut self, at: Timestamp) {
        self.processed_on = Some(at);
        self.error = None;
    }

    /// Records a failed delivery attempt and schedules the retry.
    ///
    /// Backoff is exponential: after failure number k the message becomes
    /// eligible again at `at + 2^k` minutes (2min, 4min, 8min, ...).
    pub fn mark_failed(&mut self, error: impl Into<String>, at: Timestamp) {
        self.error = Some(error.into());
        self.retry_count += 1;

        let delay_minutes = 2u64.pow(self.retry_count.min(31));
        self.next_retry_at = Some(at.plus_minutes(delay_minutes));
    }

    /// Permanently fails the message.
    ///
    /// Sets `processed_on` so the dispatcher stops polling the row, keeps
    /// the error, and pins `retry_count` at the cap.
    pub fn mark_dead_letter(&mut self, error: impl Into<String>, at: Timestamp, max_retries: u32) {
        self.error = Some(error.into());
        self.retry_count = max_retries;
        self.processed_on = Some(at);
    }
}
