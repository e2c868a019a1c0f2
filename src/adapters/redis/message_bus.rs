//! Redis-backed message bus for production deployments.
//!
//! Publishes each event envelope as JSON on a per-type pub/sub channel
//! (`events:product.created.v1`, ...). Consumers subscribe with PSUBSCRIBE
//! and must tolerate duplicates: the dispatcher delivers at-least-once.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::MessageBus;

/// Redis pub/sub implementation of the message bus.
#[derive(Clone)]
pub struct RedisMessageBus {
    conn: MultiplexedConnection,
    channel_prefix: String,
}

impl RedisMessageBus {
    /// Creates a bus over an established connection.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            channel_prefix: "events:".to_string(),
        }
    }

    /// Connects to Redis and creates a bus.
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(|e| {
            DomainError::new(
                ErrorCode::PublishFailed,
                format!("Invalid Redis URL: {}", e),
            )
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::PublishFailed,
                    format!("Failed to connect to Redis: {}", e),
                )
            })?;
        Ok(Self::new(conn))
    }

    /// Overrides the channel prefix.
    pub fn with_channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = prefix.into();
        self
    }

    fn channel_for(&self, event_type: &str) -> String {
        format!("{}{}", self.channel_prefix, event_type)
    }
}

#[async_trait]
impl MessageBus for RedisMessageBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event).map_err(|e| {
            DomainError::new(
                ErrorCode::SerializationFailed,
                format!("Failed to serialize event envelope: {}", e),
            )
        })?;
        let channel = self.channel_for(&event.event_type);

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&channel, payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::PublishFailed,
                    format!("Failed to publish '{}': {}", event.event_type, e),
                )
            })?;

        tracing::debug!(
            event_id = %event.event_id,
            channel = %channel,
            "event published to redis"
        );
        Ok(())
    }
}
