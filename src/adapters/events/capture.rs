//! Commit-time event capture.
//!
//! The write half of the Transactional Outbox Pattern: when a unit of work
//! commits, every domain event raised by the touched aggregates must land
//! in the outbox table inside that same transaction. Both the business
//! change and its outbox rows persist, or neither does.
//!
//! `EventCapture` implements the `PreCommitHook` port, so unit-of-work
//! implementations invoke it with the changed aggregates immediately before
//! committing and abort on error.
//!
//! # Example
//!
//! ```ignore
//! // In a command handler:
//! let mut tx = pool.begin().await?;
//!
//! let mut product = Product::create(name, price_cents, desc, category, image)?;
//! product_repo.save_in_tx(&product, &mut tx).await?;
//!
//! // Stage outbox rows in the same transaction, honoring the result:
//! capture
//!     .before_commit(&mut [&mut product], correlation_id.as_deref())
//!     .await?;
//!
//! tx.commit().await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{AggregateRoot, DomainError};
use crate::domain::outbox::OutboxMessage;
use crate::ports::{EventNotifier, OutboxStore, PreCommitHook};

/// Harvests pending domain events into the outbox at commit time.
///
/// The outbox store handle must be scoped to the caller's transaction;
/// see the Postgres adapter's in-transaction methods.
pub struct EventCapture {
    outbox: Arc<dyn OutboxStore>,
    notifier: Option<Arc<dyn EventNotifier>>,
}

impl EventCapture {
    /// Creates a capture writing through the given store.
    pub fn new(outbox: Arc<dyn OutboxStore>) -> Self {
        Self {
            outbox,
            notifier: None,
        }
    }

    /// Additionally deliver each captured event to in-process handlers.
    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Drains pending events from the aggregates into the outbox.
    ///
    /// Per-aggregate event order is preserved; ordering across aggregates
    /// follows slice order. Pending lists are cleared only after every
    /// event is staged, so a failure leaves the aggregates untouched and
    /// the caller rolls the transaction back.
    pub async fn capture(
        &self,
        aggregates: &mut [&mut dyn AggregateRoot],
        correlation_id: Option<&str>,
    ) -> Result<Vec<OutboxMessage>, DomainError> {
        let event_count: usize = aggregates.iter().map(|a| a.pending_events().len()).sum();
        if event_count == 0 {
            return Ok(Vec::new());
        }

        tracing::info!(
            events = event_count,
            aggregates = aggregates.len(),
            "capturing domain events into outbox"
        );

        let mut messages = Vec::with_capacity(event_count);
        for aggregate in aggregates.iter() {
            for envelope in aggregate.pending_events() {
                let message = self.outbox.add_event(envelope, correlation_id).await?;

                if let Some(notifier) = &self.notifier {
                    let mut event = envelope.clone();
                    if let Some(correlation_id) = correlation_id {
                        event = event.with_correlation_id(correlation_id);
                    }
                    notifier.notify(event).await?;
                }

                messages.push(message);
            }
        }

        for aggregate in aggregates.iter_mut() {
            aggregate.clear_pending_events();
        }

        Ok(messages)
    }
}

#[async_trait]
impl PreCommitHook for EventCapture {
    async fn before_commit(
        &self,
        aggregates: &mut [&mut dyn AggregateRoot],
        correlation_id: Option<&str>,
    ) -> Result<(), DomainError> {
        self.capture(aggregates, correlation_id).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "EventCapture"
    }
}
