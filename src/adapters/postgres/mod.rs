//! PostgreSQL adapters - Durable storage for the outbox.

mod outbox_store;

pub use outbox_store::PostgresOutboxStore;
