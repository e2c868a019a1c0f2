//! Event infrastructure for domain event publishing.
//!
//! Core types and traits for the event-driven pieces of the platform:
//! - `EventId` - Unique identifier for events (deduplication)
//! - `EventMetadata` - Correlation context propagated with every event
//! - `EventEnvelope` - Transport wrapper for domain events
//! - `DomainEvent` - Trait that all domain events implement
//! - `domain_event!` - Macro to simplify DomainEvent implementations

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

/// Trait that all domain events must implement.
///
/// Provides the contract for event identification, routing, and ordering.
/// The event type string is the stable wire discriminator: it is what the
/// outbox stores and what the event type registry resolves at dispatch time,
/// so renaming a Rust type never breaks deserialization as long as the
/// string stays put.
///
/// Use the `domain_event!` macro to implement this trait with minimal
/// boilerplate.
pub trait DomainEvent: Send + Sync {
    /// Returns the event type string (e.g., "product.created.v1").
    /// Used for routing and registry lookup.
    fn event_type(&self) -> &'static str;

    /// Returns the ID of the aggregate that emitted this event.
    fn aggregate_id(&self) -> String;

    /// Returns the type of aggregate (e.g., "Product", "Cart").
    fn aggregate_type(&self) -> &'static str;

    /// Returns when the event occurred.
    fn occurred_at(&self) -> Timestamp;

    /// Returns the unique ID for this event instance.
    fn event_id(&self) -> EventId;
}

/// Macro to implement DomainEvent trait with minimal boilerplate.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct ProductCreatedEvent {
///     pub event_id: EventId,
///     pub product_id: ProductId,
///     pub name: String,
///     pub occurred_at: Timestamp,
/// }
///
/// domain_event!(
///     ProductCreatedEvent,
///     event_type = "product.created.v1",
///     aggregate_id = product_id,
///     aggregate_type = "Product",
///     occurred_at = occurred_at,
///     event_id = event_id
/// );
/// ```
#[macro_export]
macro_rules! domain_event {
    (
        $event_name:ident,
        event_type = $event_type:expr,
        aggregate_id = $agg_id_field:ident,
        aggregate_type = $agg_type:expr,
        occurred_at = $occurred_field:ident,
        event_id = $event_id_field:ident
    ) => {
        impl $crate::domain::foundation::DomainEvent for $event_name {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn aggregate_id(&self) -> String {
                self.$agg_id_field.to_string()
            }

            fn aggregate_type(&self) -> &'static str {
                $agg_type
            }

            fn occurred_at(&self) -> $crate::domain::foundation::Timestamp {
                self.$occurred_field
            }

            fn event_id(&self) -> $crate::domain::foundation::EventId {
                self.$event_id_field.clone()
            }
        }
    };
}

// Re-export the macro
pub use crate::domain_event;

/// Unique identifier for events (used for deduplication).
///
/// Uses a String internally to allow for various ID formats while staying
/// trivially serializable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    ///
    /// No validation is performed - any non-empty string is accepted.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation context that flows through the event system.
///
/// - `correlation_id` - Links related events across a single request
/// - `user_id` - User who triggered this event chain (audit)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// ID linking related events across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// User who initiated the action that led to this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Transport envelope for domain events.
///
/// Wraps event-specific data with metadata needed for:
/// - Routing (event_type)
/// - Deduplication (event_id)
/// - Correlation (aggregate_id, metadata)
/// - Ordering (occurred_at)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique ID for this event instance.
    pub event_id: EventId,

    /// Event type for routing (e.g., "product.created.v1").
    pub event_type: String,

    /// ID of the aggregate that emitted this event.
    pub aggregate_id: String,

    /// Type of aggregate (e.g., "Product", "Cart").
    pub aggregate_type: String,

    /// When the event occurred.
    pub occurred_at: Timestamp,

    /// Event-specific payload as JSON.
    pub payload: JsonValue,

    /// Correlation metadata.
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Creates a new EventEnvelope with required fields.
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            occurred_at: Timestamp::now(),
            payload,
            metadata: EventMetadata::default(),
        }
    }

    /// Creates an envelope from a domain event with automatic serialization.
    ///
    /// This is the preferred way to create envelopes inside aggregates,
    /// as it extracts all required fields from the DomainEvent trait.
    pub fn from_event<T>(event: &T) -> Self
    where
        T: DomainEvent + Serialize,
    {
        Self {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            aggregate_id: event.aggregate_id(),
            aggregate_type: event.aggregate_type().to_string(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)
                .expect("Event serialization should never fail for well-formed events"),
            metadata: EventMetadata::default(),
        }
    }

    /// Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Add user ID for audit.
    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(id.into());
        self
    }

    /// Deserialize payload to a specific event type.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
impl EventEnvelope {
    /// Creates a test fixture EventEnvelope for use in tests.
    pub fn test_fixture() -> Self {
        Self::new(
            "test.event.v1",
            "test-aggregate-123",
            "TestAggregate",
            serde_json::json!({"test": "data"}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_id_generates_unique_values() {
        let id1 = EventId::new();
        let id2 = EventId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn event_id_from_string_preserves_value() {
        let id = EventId::from_string("evt-123");
        assert_eq!(id.as_str(), "evt-123");
    }

    #[test]
    fn event_id_serializes_transparently() {
        let id = EventId::from_string("evt-456");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""evt-456""#);

        let restored: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn event_metadata_default_has_all_none() {
        let meta = EventMetadata::default();
        assert!(meta.correlation_id.is_none());
        assert!(meta.user_id.is_none());
    }

    #[test]
    fn event_metadata_serializes_without_none_fields() {
        let meta = EventMetadata {
            correlation_id: Some("req-123".to_string()),
            user_id: None,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("correlation_id"));
        assert!(!json.contains("user_id"));
    }

    #[test]
    fn event_envelope_new_creates_with_defaults() {
        let envelope = EventEnvelope::new(
            "product.created.v1",
            "product-123",
            "Product",
            json!({"name": "Keyboard"}),
        );

        assert_eq!(envelope.event_type, "product.created.v1");
        assert_eq!(envelope.aggregate_id, "product-123");
        assert_eq!(envelope.aggregate_type, "Product");
        assert_eq!(envelope.payload["name"], "Keyboard");
        assert!(envelope.metadata.correlation_id.is_none());
    }

    #[test]
    fn event_envelope_builder_chain() {
        let envelope = EventEnvelope::new("test.event", "agg-1", "Test", json!({}))
            .with_correlation_id("req-123")
            .with_user_id("user-456");

        assert_eq!(envelope.metadata.correlation_id, Some("req-123".to_string()));
        assert_eq!(envelope.metadata.user_id, Some("user-456".to_string()));
    }

    #[test]
    fn event_envelope_serialization_round_trip() {
        let envelope = EventEnvelope::new(
            "cart.item_added.v1",
            "cart-123",
            "Cart",
            json!({"quantity": 2}),
        )
        .with_correlation_id("req-456");

        let json = serde_json::to_string(&envelope).unwrap();
        let restored: EventEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, envelope);
    }

    #[test]
    fn event_envelope_payload_as_deserializes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestPayload {
            value: i32,
            name: String,
        }

        let envelope = EventEnvelope::new(
            "test.event",
            "agg-1",
            "Test",
            json!({"value": 42, "name": "test"}),
        );

        let payload: TestPayload = envelope.payload_as().unwrap();
        assert_eq!(payload.value, 42);
        assert_eq!(payload.name, "test");
    }

    #[test]
    fn event_envelope_payload_as_returns_error_on_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct WrongPayload {
            missing_field: String,
        }

        let envelope = EventEnvelope::new(
            "test.event",
            "agg-1",
            "Test",
            json!({"different": "data"}),
        );

        let result: Result<WrongPayload, _> = envelope.payload_as();
        assert!(result.is_err());
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestProductCreated {
        event_id: EventId,
        product_id: String,
        name: String,
        occurred_at: Timestamp,
    }

    impl DomainEvent for TestProductCreated {
        fn event_type(&self) -> &'static str {
            "test.product.created"
        }

        fn aggregate_id(&self) -> String {
            self.product_id.clone()
        }

        fn aggregate_type(&self) -> &'static str {
            "TestProduct"
        }

        fn occurred_at(&self) -> Timestamp {
            self.occurred_at
        }

        fn event_id(&self) -> EventId {
            self.event_id.clone()
        }
    }

    #[test]
    fn from_event_creates_valid_envelope() {
        let event = TestProductCreated {
            event_id: EventId::from_string("evt-123"),
            product_id: "product-456".to_string(),
            name: "Monitor".to_string(),
            occurred_at: Timestamp::now(),
        };

        let envelope = EventEnvelope::from_event(&event);

        assert_eq!(envelope.event_id.as_str(), "evt-123");
        assert_eq!(envelope.event_type, "test.product.created");
        assert_eq!(envelope.aggregate_id, "product-456");
        assert_eq!(envelope.aggregate_type, "TestProduct");
        assert_eq!(envelope.payload["name"], "Monitor");
    }

    #[test]
    fn from_event_preserves_occurred_at() {
        let occurred_at = Timestamp::now();
        let event = TestProductCreated {
            event_id: EventId::new(),
            product_id: "product-1".to_string(),
            name: "Test".to_string(),
            occurred_at,
        };

        let envelope = EventEnvelope::from_event(&event);

        assert_eq!(envelope.occurred_at, occurred_at);
    }

    #[test]
    fn from_event_payload_round_trips() {
        let event = TestProductCreated {
            event_id: EventId::from_string("evt-789"),
            product_id: "product-abc".to_string(),
            name: "Round Trip".to_string(),
            occurred_at: Timestamp::now(),
        };

        let envelope = EventEnvelope::from_event(&event);
        let restored: TestProductCreated = envelope.payload_as().unwrap();

        assert_eq!(restored.event_id.as_str(), "evt-789");
        assert_eq!(restored.product_id, "product-abc");
        assert_eq!(restored.name, "Round Trip");
    }
}
