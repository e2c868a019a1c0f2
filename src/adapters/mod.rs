//! Adapters - Concrete implementations of the ports.

pub mod events;
pub mod postgres;
pub mod redis;

pub use events::{
    AuditLogHandler, BatchOutcome, DispatcherConfig, EventCapture, InMemoryOutboxStore,
    LocalEventBus, ManualClock, OutboxDispatcher,
};
pub use postgres::PostgresOutboxStore;
pub use redis::RedisMessageBus;
