//! Ports - Interfaces between the core and the outside world.
//!
//! Following hexagonal architecture, the domain and the event pipeline
//! depend only on these traits; adapters provide the implementations.

mod clock;
mod event_handler;
mod message_bus;
mod outbox_store;
mod pre_commit;

pub use clock::{Clock, SystemClock};
pub use event_handler::{EventHandler, EventNotifier, EventSubscriber};
pub use message_bus::MessageBus;
pub use outbox_store::OutboxStore;
pub use pre_commit::PreCommitHook;
