//! Synchronous in-process event bus.
//!
//! Delivers captured events to same-process handlers (audit logging and
//! friends) on the committing task, and doubles as a deterministic bus for
//! tests. This is NOT the external message bus: delivery here is
//! synchronous, unbuffered, and gone if the process dies.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventNotifier, EventSubscriber};

/// In-process event bus with synchronous handler dispatch.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned; a poisoned lock means
/// a handler panicked on another task, at which point the process state is
/// already suspect.
pub struct LocalEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    delivered: RwLock<Vec<EventEnvelope>>,
}

impl LocalEventBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            delivered: RwLock::new(Vec::new()),
        }
    }

    // === Test Helpers ===

    /// Returns all delivered events (for test assertions).
    pub fn delivered_events(&self) -> Vec<EventEnvelope> {
        self.delivered
            .read()
            .expect("LocalEventBus: delivered lock poisoned")
            .clone()
    }

    /// Returns delivered events of a specific type.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.delivered_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Returns count of delivered events.
    pub fn event_count(&self) -> usize {
        self.delivered
            .read()
            .expect("LocalEventBus: delivered lock poisoned")
            .len()
    }

    /// Checks if a specific event type was delivered.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.delivered
            .read()
            .expect("LocalEventBus: delivered lock poisoned")
            .iter()
            .any(|e| e.event_type == event_type)
    }

    /// Clears delivered events (for test isolation).
    pub fn clear(&self) {
        self.delivered
            .write()
            .expect("LocalEventBus: delivered write lock poisoned")
            .clear();
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventNotifier for LocalEventBus {
    async fn notify(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.delivered
            .write()
            .expect("LocalEventBus: delivered write lock poisoned")
            .push(event.clone());

        // Clone handlers to release the lock before await points
        let type_handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self
                .handlers
                .read()
                .expect("LocalEventBus: handlers lock poisoned");
            handlers.get(&event.event_type).cloned().unwrap_or_default()
        };

        let mut errors = Vec::new();
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }
}

impl EventSubscriber for LocalEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        let mut handlers = self
            .handlers
            .write()
            .expect("LocalEventBus: handlers write lock poisoned");
        handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        let mut handlers = self
            .handlers
            .write()
            .expect("LocalEventBus: handlers write lock poisoned");
        for event_type in event_types {
            handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Arc::clone(&handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_envelope(event_type: &str, aggregate_id: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, aggregate_id, "Test", serde_json::json!({}))
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    #[tokio::test]
    async fn notify_records_event() {
        let bus = LocalEventBus::new();

        bus.notify(test_envelope("product.created.v1", "p-1"))
            .await
            .unwrap();

        assert_eq!(bus.event_count(), 1);
        assert!(bus.has_event("product.created.v1"));
    }

    #[tokio::test]
    async fn events_of_type_filters_correctly() {
        let bus = LocalEventBus::new();

        bus.notify(test_envelope("type.a", "1")).await.unwrap();
        bus.notify(test_envelope("type.b", "2")).await.unwrap();
        bus.notify(test_envelope("type.a", "3")).await.unwrap();

        assert_eq!(bus.events_of_type("type.a").len(), 2);
    }

    #[tokio::test]
    async fn handler_receives_matching_event() {
        let bus = LocalEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.subscribe("cart.cleared.v1", Arc::new(CountingHandler(count.clone())));
        bus.notify(test_envelope("cart.cleared.v1", "c-1"))
            .await
            .unwrap();
        bus.notify(test_envelope("cart.item_added.v1", "c-1"))
            .await
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn multiple_handlers_all_invoked() {
        let bus = LocalEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.subscribe("t", Arc::new(CountingHandler(count.clone())));
        bus.subscribe("t", Arc::new(CountingHandler(count.clone())));
        bus.subscribe("t", Arc::new(CountingHandler(count.clone())));

        bus.notify(test_envelope("t", "1")).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn subscribe_all_registers_for_multiple_types() {
        let bus = LocalEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.subscribe_all(&["type.a", "type.b"], Arc::new(CountingHandler(count.clone())));

        bus.notify(test_envelope("type.a", "1")).await.unwrap();
        bus.notify(test_envelope("type.b", "2")).await.unwrap();
        bus.notify(test_envelope("type.c", "3")).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_error_is_propagated() {
        struct FailingHandler;

        #[async_trait]
        impl EventHandler for FailingHandler {
            async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
                Err(DomainError::new(ErrorCode::InternalError, "Handler failed"))
            }
            fn name(&self) -> &'static str {
                "FailingHandler"
            }
        }

        let bus = LocalEventBus::new();
        bus.subscribe("t", Arc::new(FailingHandler));

        let result = bus.notify(test_envelope("t", "1")).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().message.contains("FailingHandler"));
    }

    #[tokio::test]
    async fn clear_removes_recorded_events() {
        let bus = LocalEventBus::new();
        bus.notify(test_envelope("t", "1")).await.unwrap();
        bus.notify(test_envelope("t", "2")).await.unwrap();

        bus.clear();

        assert_eq!(bus.event_count(), 0);
    }
}
