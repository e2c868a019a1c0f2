//! Aggregate root support for domain event recording.
//!
//! Aggregates accumulate domain events while business operations run and
//! expose them through [`AggregateRoot`] so commit-time capture can harvest
//! them. The pending list lives only in memory: once the events are durably
//! recorded in the outbox the list is cleared, and a dropped aggregate
//! simply discards whatever it had recorded.

use super::EventEnvelope;

/// In-memory list of events an aggregate has raised but not yet handed off.
///
/// Embedded by each aggregate; never serialized or persisted.
#[derive(Debug, Clone, Default)]
pub struct PendingEvents {
    events: Vec<EventEnvelope>,
}

impl PendingEvents {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event, preserving insertion order.
    pub fn record(&mut self, envelope: EventEnvelope) {
        self.events.push(envelope);
    }

    /// Returns the recorded events in insertion order.
    pub fn as_slice(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Removes all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events are recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Object-safe view over an aggregate's pending domain events.
///
/// Commit-time capture receives the touched aggregates as
/// `&mut dyn AggregateRoot`, reads the pending events, and clears the list
/// once every event has been written to the outbox. An aggregate whose
/// pending list is never cleared would re-enqueue the same events on a
/// later, unrelated commit.
pub trait AggregateRoot: Send {
    /// The aggregate type name (e.g. "Product"), used for logging.
    fn aggregate_type(&self) -> &'static str;

    /// Events raised since the last clear, in insertion order.
    fn pending_events(&self) -> &[EventEnvelope];

    /// Clears the pending event list.
    fn clear_pending_events(&mut self);
}
