//! Atomicity tests for commit-time event capture.
//!
//! The outbox guarantee is bidirectional: after a successful commit there is
//! exactly one outbox row per raised event, and the business change is
//! visible iff its rows are. These tests drive EventCapture through a small
//! in-memory unit of work that stages business writes and outbox inserts,
//! then applies both or neither depending on the pre-commit hook result.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use uuid::Uuid;

use storefront_events::adapters::EventCapture;
use storefront_events::domain::cart::Cart;
use storefront_events::domain::catalog::Product;
use storefront_events::domain::foundation::{
    AggregateRoot, DomainError, ErrorCode, EventEnvelope, ProductId, Timestamp,
};
use storefront_events::domain::outbox::OutboxMessage;
use storefront_events::ports::{OutboxStore, PreCommitHook};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Outbox store that stages inserts until the unit of work commits.
struct StagingOutboxStore {
    staged: Mutex<Vec<OutboxMessage>>,
    committed: RwLock<Vec<OutboxMessage>>,
    fail_inserts: bool,
}

impl StagingOutboxStore {
    fn new() -> Self {
        Self {
            staged: Mutex::new(Vec::new()),
            committed: RwLock::new(Vec::new()),
            fail_inserts: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Self::new()
        }
    }

    fn apply_staged(&self) {
        let mut staged = self.staged.lock().expect("lock poisoned");
        self.committed
            .write()
            .expect("lock poisoned")
            .append(&mut staged);
    }

    fn discard_staged(&self) {
        self.staged.lock().expect("lock poisoned").clear();
    }

    fn committed_messages(&self) -> Vec<OutboxMessage> {
        self.committed.read().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl OutboxStore for StagingOutboxStore {
    async fn add_event(
        &self,
        event: &EventEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<OutboxMessage, DomainError> {
        if self.fail_inserts {
            return Err(DomainError::new(ErrorCode::DatabaseError, "outbox insert failed"));
        }
        let message = OutboxMessage::from_envelope(event, correlation_id);
        self.staged.lock().expect("lock poisoned").push(message.clone());
        Ok(message)
    }

    async fn get_unprocessed(&self, batch_size: u32) -> Result<Vec<OutboxMessage>, DomainError> {
        Ok(self
            .committed_messages()
            .into_iter()
            .take(batch_size as usize)
            .collect())
    }

    async fn mark_processed(&self, _: Uuid, _: Timestamp) -> Result<(), DomainError> {
        Ok(())
    }

    async fn mark_failed(&self, _: Uuid, _: &str, _: Timestamp) -> Result<(), DomainError> {
        Ok(())
    }

    async fn mark_dead_letter(&self, _: Uuid, _: &str, _: Timestamp) -> Result<(), DomainError> {
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OutboxMessage>, DomainError> {
        Ok(self.committed_messages().into_iter().find(|m| m.id == id))
    }

    async fn cleanup_processed(&self, _: Duration) -> Result<u64, DomainError> {
        Ok(0)
    }
}

/// Minimal unit of work: stages a business write, runs the pre-commit hook,
/// then applies everything or rolls everything back.
struct InMemoryUnitOfWork {
    outbox: Arc<StagingOutboxStore>,
    business_rows: RwLock<Vec<String>>,
}

impl InMemoryUnitOfWork {
    fn new(outbox: Arc<StagingOutboxStore>) -> Self {
        Self {
            outbox,
            business_rows: RwLock::new(Vec::new()),
        }
    }

    async fn commit(
        &self,
        business_row: &str,
        aggregates: &mut [&mut dyn AggregateRoot],
        hook: &dyn PreCommitHook,
        correlation_id: Option<&str>,
    ) -> Result<(), DomainError> {
        match hook.before_commit(aggregates, correlation_id).await {
            Ok(()) => {
                self.outbox.apply_staged();
                self.business_rows
                    .write()
                    .expect("lock poisoned")
                    .push(business_row.to_string());
                Ok(())
            }
            Err(e) => {
                self.outbox.discard_staged();
                Err(e)
            }
        }
    }

    fn business_rows(&self) -> Vec<String> {
        self.business_rows.read().expect("lock poisoned").clone()
    }
}

fn sample_product() -> Product {
    Product::create("Blender", 79_00, "Countertop blender", "Kitchen", "https://img.example/blender.jpg")
        .unwrap()
}

// =============================================================================
// Atomicity Tests
// =============================================================================

/// N raised events yield exactly N outbox rows, committed together with the
/// business change.
#[tokio::test]
async fn successful_commit_persists_state_and_outbox_rows_together() {
    let outbox = Arc::new(StagingOutboxStore::new());
    let uow = InMemoryUnitOfWork::new(outbox.clone());
    let capture = EventCapture::new(outbox.clone());

    let mut product = sample_product();
    product.change_price(69_00).unwrap();
    let mut cart = Cart::new("user-1");
    cart.add_item(product.id(), 1, 69_00).unwrap();

    uow.commit(
        "product+cart",
        &mut [&mut product, &mut cart],
        &capture,
        Some("req-1"),
    )
    .await
    .unwrap();

    // Three events raised -> exactly three rows.
    let messages = outbox.committed_messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(uow.business_rows(), vec!["product+cart".to_string()]);
    for message in &messages {
        assert_eq!(message.correlation_id, Some("req-1".to_string()));
        assert!(!message.is_processed());
    }

    // Pending lists were cleared by the capture.
    assert!(product.pending_events().is_empty());
    assert!(cart.pending_events().is_empty());
}

/// A capture failure aborts the whole commit: no business row, no outbox
/// rows, aggregates untouched.
#[tokio::test]
async fn capture_failure_rolls_back_the_whole_commit() {
    let outbox = Arc::new(StagingOutboxStore::failing());
    let uow = InMemoryUnitOfWork::new(outbox.clone());
    let capture = EventCapture::new(outbox.clone());

    let mut product = sample_product();

    let result = uow
        .commit("product", &mut [&mut product], &capture, None)
        .await;

    assert_eq!(result.unwrap_err().code, ErrorCode::DatabaseError);
    assert!(outbox.committed_messages().is_empty());
    assert!(uow.business_rows().is_empty());
    // The events are still pending, ready for a fresh unit of work.
    assert_eq!(product.pending_events().len(), 1);
}

/// Business state is visible iff at least one outbox row from the same
/// commit is - in both directions.
#[tokio::test]
async fn state_and_outbox_rows_are_visible_together_or_not_at_all() {
    // Direction 1: success -> both visible.
    let good_outbox = Arc::new(StagingOutboxStore::new());
    let good_uow = InMemoryUnitOfWork::new(good_outbox.clone());
    let good_capture = EventCapture::new(good_outbox.clone());
    let mut product = sample_product();
    good_uow
        .commit("row", &mut [&mut product], &good_capture, None)
        .await
        .unwrap();
    assert_eq!(good_uow.business_rows().is_empty(), good_outbox.committed_messages().is_empty());
    assert!(!good_outbox.committed_messages().is_empty());

    // Direction 2: failure -> neither visible.
    let bad_outbox = Arc::new(StagingOutboxStore::failing());
    let bad_uow = InMemoryUnitOfWork::new(bad_outbox.clone());
    let bad_capture = EventCapture::new(bad_outbox.clone());
    let mut product = sample_product();
    let _ = bad_uow
        .commit("row", &mut [&mut product], &bad_capture, None)
        .await;
    assert_eq!(bad_uow.business_rows().is_empty(), bad_outbox.committed_messages().is_empty());
    assert!(bad_outbox.committed_messages().is_empty());
}

/// Once captured, events are cleared; a later commit of the same aggregate
/// only enqueues what was raised since.
#[tokio::test]
async fn later_commit_does_not_reenqueue_captured_events() {
    let outbox = Arc::new(StagingOutboxStore::new());
    let uow = InMemoryUnitOfWork::new(outbox.clone());
    let capture = EventCapture::new(outbox.clone());

    let mut cart = Cart::new("user-2");
    cart.add_item(ProductId::new(), 1, 12_00).unwrap();

    uow.commit("cart", &mut [&mut cart], &capture, None)
        .await
        .unwrap();
    assert_eq!(outbox.committed_messages().len(), 1);

    // Second operation, second commit: exactly one new row.
    cart.clear();
    uow.commit("cart", &mut [&mut cart], &capture, None)
        .await
        .unwrap();

    let messages = outbox.committed_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].event_type, "cart.item_added.v1");
    assert_eq!(messages[1].event_type, "cart.cleared.v1");
}
