//! Event pipeline adapters.
//!
//! - `EventCapture` - commit-time harvesting of domain events into the outbox
//! - `OutboxDispatcher` - background delivery from the outbox to the bus
//! - `LocalEventBus` - synchronous in-process fan-out (audit logging, tests)
//! - `AuditLogHandler` - structured audit record per captured event
//! - `InMemoryOutboxStore` / `ManualClock` - deterministic test adapters

mod audit;
mod capture;
mod dispatcher;
mod in_memory;
mod local_bus;

pub use audit::AuditLogHandler;
pub use capture::EventCapture;
pub use dispatcher::{BatchOutcome, DispatcherConfig, OutboxDispatcher};
pub use in_memory::{InMemoryOutboxStore, ManualClock};
pub use local_bus::LocalEventBus;
