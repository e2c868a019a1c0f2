//! PostgreSQL implementation of the outbox store.
//!
//! Persists outbox messages to the `outbox_messages` table. The port
//! methods run against the pool; command handlers that need the outbox
//! insert inside their own transaction use [`PostgresOutboxStore::add_event_in_tx`].

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Postgres, Row, Transaction};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, Timestamp};
use crate::domain::outbox::OutboxMessage;
use crate::ports::{Clock, OutboxStore};

/// PostgreSQL implementation of the outbox store.
#[derive(Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl PostgresOutboxStore {
    /// Creates a new store over the given pool.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            max_retries: 5,
        }
    }

    /// Overrides the retry cap used when pinning dead-lettered messages.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Inserts an outbox message inside the caller's transaction.
    ///
    /// This is the co-transactional path of the outbox pattern: call it
    /// from a command handler between the aggregate save and the commit,
    /// and the event insert shares the fate of the business writes.
    pub async fn add_event_in_tx(
        &self,
        event: &EventEnvelope,
        correlation_id: Option<&str>,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<OutboxMessage, DomainError> {
        let message = OutboxMessage::from_envelope(event, correlation_id);
        self.insert_message(&mut **tx, &message).await?;

        tracing::info!(
            message_id = %message.id,
            event_type = %message.event_type,
            "outbox message added"
        );
        Ok(message)
    }

    async fn insert_message<'e, E>(&self, executor: E, message: &OutboxMessage) -> Result<(), DomainError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO outbox_messages (
                id, event_type, content, correlation_id, occurred_on,
                processed_on, error, retry_count, next_retry_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(message.id)
        .bind(&message.event_type)
        .bind(&message.content)
        .bind(&message.correlation_id)
        .bind(message.occurred_on.as_datetime())
        .bind(message.processed_on.map(|t| *t.as_datetime()))
        .bind(&message.error)
        .bind(message.retry_count as i32)
        .bind(message.next_retry_at.map(|t| *t.as_datetime()))
        .execute(executor)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert outbox message: {}", e),
            )
        })?;

        Ok(())
    }

    /// Writes the mutable columns of a message back to its row.
    async fn update_message(&self, message: &OutboxMessage) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE outbox_messages SET
                processed_on = $2,
                error = $3,
                retry_count = $4,
                next_retry_at = $5
            WHERE id = $1
            "#,
        )
        .bind(message.id)
        .bind(message.processed_on.map(|t| *t.as_datetime()))
        .bind(&message.error)
        .bind(message.retry_count as i32)
        .bind(message.next_retry_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update outbox message: {}", e),
            )
        })?;

        Ok(())
    }

    /// Loads a message, logging a warning when the row is gone.
    async fn load_for_update(&self, id: Uuid) -> Result<Option<OutboxMessage>, DomainError> {
        let message = self.get_by_id(id).await?;
        if message.is_none() {
            tracing::warn!(message_id = %id, "outbox message not found");
        }
        Ok(message)
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn add_event(
        &self,
        event: &EventEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<OutboxMessage, DomainError> {
        let message = OutboxMessage::from_envelope(event, correlation_id);
        self.insert_message(&self.pool, &message).await?;

        tracing::info!(
            message_id = %message.id,
            event_type = %message.event_type,
            "outbox message added"
        );
        Ok(message)
    }

    async fn get_unprocessed(&self, batch_size: u32) -> Result<Vec<OutboxMessage>, DomainError> {
        let now = self.clock.now();

        let rows = sqlx::query(
            r#"
            SELECT id, event_type, content, correlation_id, occurred_on,
                   processed_on, error, retry_count, next_retry_at
            FROM outbox_messages
            WHERE processed_on IS NULL
              AND (next_retry_at IS NULL OR next_retry_at <= $1)
            ORDER BY occurred_on ASC
            LIMIT $2
            "#,
        )
        .bind(now.as_datetime())
        .bind(batch_size as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch unprocessed outbox messages: {}", e),
            )
        })?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn mark_processed(&self, id: Uuid, at: Timestamp) -> Result<(), DomainError> {
        let Some(mut message) = self.load_for_update(id).await? else {
            return Ok(());
        };

        message.mark_processed(at);
        self.update_message(&message).await?;

        tracing::info!(message_id = %id, "outbox message processed");
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, at: Timestamp) -> Result<(), DomainError> {
        let Some(mut message) = self.load_for_update(id).await? else {
            return Ok(());
        };

        message.mark_failed(error, at);
        self.update_message(&message).await?;

        tracing::warn!(
            message_id = %id,
            retry_count = message.retry_count,
            error = %error,
            "outbox message failed"
        );
        Ok(())
    }

    async fn mark_dead_letter(&self, id: Uuid, error: &str, at: Timestamp) -> Result<(), DomainError> {
        let Some(mut message) = self.load_for_update(id).await? else {
            return Ok(());
        };

        message.mark_dead_letter(error, at, self.max_retries);
        self.update_message(&message).await?;

        tracing::error!(
            message_id = %id,
            retry_count = message.retry_count,
            error = %error,
            "outbox message dead-lettered"
        );
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<OutboxMessage>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, event_type, content, correlation_id, occurred_on,
                   processed_on, error, retry_count, next_retry_at
            FROM outbox_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to fetch outbox message: {}", e),
            )
        })?;

        row.map(row_to_message).transpose()
    }

    async fn cleanup_processed(&self, older_than: Duration) -> Result<u64, DomainError> {
        let cutoff = *self.clock.now().as_datetime()
            - chrono::Duration::from_std(older_than).unwrap_or_default();

        let result = sqlx::query(
            r#"
            DELETE FROM outbox_messages
            WHERE processed_on IS NOT NULL AND processed_on <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to clean up processed outbox messages: {}", e),
            )
        })?;

        let deleted = result.rows_affected();
        tracing::info!(deleted, "cleaned up processed outbox messages");
        Ok(deleted)
    }
}

fn row_to_message(row: PgRow) -> Result<OutboxMessage, DomainError> {
    let map_err = |e: sqlx::Error| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to read outbox message row: {}", e),
        )
    };

    let occurred_on: chrono::DateTime<chrono::Utc> = row.try_get("occurred_on").map_err(map_err)?;
    let processed_on: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("processed_on").map_err(map_err)?;
    let next_retry_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("next_retry_at").map_err(map_err)?;
    let retry_count: i32 = row.try_get("retry_count").map_err(map_err)?;

    Ok(OutboxMessage {
        id: row.try_get("id").map_err(map_err)?,
        event_type: row.try_get("event_type").map_err(map_err)?,
        content: row.try_get("content").map_err(map_err)?,
        correlation_id: row.try_get("correlation_id").map_err(map_err)?,
        occurred_on: Timestamp::from_datetime(occurred_on),
        processed_on: processed_on.map(Timestamp::from_datetime),
        error: row.try_get("error").map_err(map_err)?,
        retry_count: retry_count.max(0) as u32,
        next_retry_at: next_retry_at.map(Timestamp::from_datetime),
    })
}
