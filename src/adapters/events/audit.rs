//! Audit logging event handler.
//!
//! Subscribed to every platform event type on the local bus; writes a
//! structured audit record the moment an event is captured, without waiting
//! for bus delivery.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventHandler;

/// Logs every captured event under the `audit` target.
#[derive(Debug, Default)]
pub struct AuditLogHandler;

impl AuditLogHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for AuditLogHandler {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            target: "audit",
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            user_id = event.metadata.user_id.as_deref().unwrap_or("-"),
            correlation_id = event.metadata.correlation_id.as_deref().unwrap_or("-"),
            "domain event captured"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AuditLogHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn audit_handler_accepts_any_event() {
        let handler = AuditLogHandler::new();
        let event = EventEnvelope::test_fixture().with_user_id("user-1");

        assert!(handler.handle(event).await.is_ok());
        assert_eq!(handler.name(), "AuditLogHandler");
    }
}
