//! Event type registry for dispatch-time deserialization.
//!
//! The outbox stores an event as a stable string discriminator plus a JSON
//! payload. At dispatch time the discriminator must be resolved back to a
//! concrete event shape. Resolution goes through an explicit map from
//! discriminator to decode function, populated once at startup; an
//! unregistered discriminator is a hard error, and renaming a Rust type has
//! no effect on the wire as long as its discriminator string is unchanged.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::{DomainError, DomainEvent, ErrorCode, EventEnvelope};

type DecodeFn = Box<dyn Fn(&str) -> Result<EventEnvelope, DomainError> + Send + Sync>;

/// Maps stable event type strings to decode functions.
#[derive(Default)]
pub struct EventTypeRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl EventTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a concrete event type under its wire discriminator.
    ///
    /// The decode function deserializes the stored payload into `T` and
    /// re-wraps it in an [`EventEnvelope`], so a payload that no longer
    /// matches the event shape fails loudly instead of publishing garbage.
    pub fn register<T>(&mut self, event_type: &str)
    where
        T: DomainEvent + Serialize + DeserializeOwned + 'static,
    {
        let discriminator = event_type.to_string();
        self.decoders.insert(
            event_type.to_string(),
            Box::new(move |content| {
                let event: T = serde_json::from_str(content).map_err(|e| {
                    DomainError::new(
                        ErrorCode::SerializationFailed,
                        format!("Failed to decode '{}' payload: {}", discriminator, e),
                    )
                })?;
                Ok(EventEnvelope::from_event(&event))
            }),
        );
    }

    /// Decodes a stored payload into an event envelope.
    ///
    /// # Errors
    ///
    /// `UnknownEventType` if the discriminator was never registered;
    /// `SerializationFailed` if the payload does not match the registered
    /// shape.
    pub fn decode(&self, event_type: &str, content: &str) -> Result<EventEnvelope, DomainError> {
        let decoder = self.decoders.get(event_type).ok_or_else(|| {
            DomainError::new(
                ErrorCode::UnknownEventType,
                format!("No decoder registered for event type '{}'", event_type),
            )
        })?;
        decoder(content)
    }

    /// True if a decoder is registered for the discriminator.
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Number of registered event types.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// True if no event types are registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
