//! Outbox dispatcher - Background delivery of captured events.
//!
//! The read half of the Transactional Outbox Pattern:
//! 1. Command handlers write events to the outbox (same transaction as the
//!    domain changes)
//! 2. **The dispatcher polls the outbox and publishes to the message bus**
//!    <- this module
//!
//! Delivery is at-least-once: publishing and marking are separate steps, so
//! a crash between them re-publishes the message on the next cycle.
//!
//! ## Graceful Shutdown
//!
//! The loop listens on a `watch` channel and exits promptly: the shutdown
//! flag is checked while sleeping, before each fetch, and between messages
//! mid-batch. Messages already marked stay marked; the rest are picked up
//! on restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::DomainError;
use crate::domain::outbox::{EventTypeRegistry, OutboxMessage};
use crate::ports::{Clock, MessageBus, OutboxStore};

/// Configuration for the outbox dispatcher.
///
/// An explicit value object passed at construction; also loadable from the
/// environment through the `outbox` config section.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How often to poll for due messages.
    pub poll_interval: Duration,

    /// Maximum messages to process per poll cycle.
    pub batch_size: u32,

    /// Failed delivery attempts before a message is dead-lettered.
    pub max_retries: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            batch_size: 20,
            max_retries: 5,
        }
    }
}

impl DispatcherConfig {
    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the batch size.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Overrides the retry cap.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Messages fetched as due.
    pub fetched: usize,
    /// Messages delivered and marked processed.
    pub published: usize,
    /// Messages marked failed (retry scheduled).
    pub failed: usize,
    /// Messages dead-lettered this cycle.
    pub dead_lettered: usize,
}

/// Background worker that drives outbox messages to a terminal state.
pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxStore>,
    bus: Arc<dyn MessageBus>,
    registry: Arc<EventTypeRegistry>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl OutboxDispatcher {
    /// Creates a dispatcher with default configuration.
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        bus: Arc<dyn MessageBus>,
        registry: Arc<EventTypeRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_config(outbox, bus, registry, clock, DispatcherConfig::default())
    }

    /// Creates a dispatcher with explicit configuration.
    pub fn with_config(
        outbox: Arc<dyn OutboxStore>,
        bus: Arc<dyn MessageBus>,
        registry: Arc<EventTypeRegistry>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            outbox,
            bus,
            registry,
            clock,
            config,
        }
    }

    /// Runs the polling loop until the shutdown flag flips to true.
    ///
    /// A failed poll cycle is logged and the loop continues; a single bad
    /// cycle must not take the worker down.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            batch_size = self.config.batch_size,
            max_retries = self.config.max_retries,
            "outbox dispatcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    if let Err(e) = self.process_batch(&shutdown).await {
                        tracing::error!(error = %e, "outbox poll cycle failed");
                    }
                }
            }
        }

        tracing::info!("outbox dispatcher stopped");
    }

    /// Runs exactly one poll cycle (for tests and manual draining).
    pub async fn poll_once(&self) -> Result<BatchOutcome, DomainError> {
        let (_tx, rx) = watch::channel(false);
        self.process_batch(&rx).await
    }

    /// Fetches one batch of due messages and processes each independently.
    ///
    /// One message's failure never aborts the rest; the shutdown flag is
    /// re-checked between messages so cancellation lands mid-batch.
    async fn process_batch(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<BatchOutcome, DomainError> {
        let messages = self.outbox.get_unprocessed(self.config.batch_size).await?;
        let mut outcome = BatchOutcome {
            fetched: messages.len(),
            ..BatchOutcome::default()
        };

        if messages.is_empty() {
            return Ok(outcome);
        }

        tracing::info!(count = messages.len(), "processing outbox messages");

        for message in &messages {
            if *shutdown.borrow() {
                tracing::info!(
                    remaining = outcome.fetched - outcome.published - outcome.failed - outcome.dead_lettered,
                    "shutdown requested mid-batch"
                );
                break;
            }
            self.dispatch_one(message, &mut outcome).await;
        }

        Ok(outcome)
    }

    /// Publishes a single message and records the terminal or retry state.
    ///
    /// Decode failures and bus failures are handled uniformly: both consume
    /// a retry. Errors from the mark calls themselves are logged and
    /// swallowed so the rest of the batch still runs.
    async fn dispatch_one(&self, message: &OutboxMessage, outcome: &mut BatchOutcome) {
        match self.try_publish(message).await {
            Ok(()) => {
                if let Err(e) = self.outbox.mark_processed(message.id, self.clock.now()).await {
                    tracing::error!(message_id = %message.id, error = %e, "failed to mark message processed");
                } else {
                    tracing::debug!(
                        message_id = %message.id,
                        event_type = %message.event_type,
                        "outbox message published"
                    );
                    outcome.published += 1;
                }
            }
            Err(publish_error) => {
                let error_text = publish_error.to_string();
                let now = self.clock.now();

                let result = if message.retry_count + 1 < self.config.max_retries {
                    outcome.failed += 1;
                    self.outbox.mark_failed(message.id, &error_text, now).await
                } else {
                    outcome.dead_lettered += 1;
                    self.outbox.mark_dead_letter(message.id, &error_text, now).await
                };

                if let Err(e) = result {
                    tracing::error!(message_id = %message.id, error = %e, "failed to record delivery failure");
                }
            }
        }
    }

    /// Decodes the stored payload and hands the event to the bus.
    async fn try_publish(&self, message: &OutboxMessage) -> Result<(), DomainError> {
        let mut envelope = self.registry.decode(&message.event_type, &message.content)?;
        if let Some(correlation_id) = &message.correlation_id {
            envelope = envelope.with_correlation_id(correlation_id);
        }
        self.bus.publish(envelope).await
    }
}
