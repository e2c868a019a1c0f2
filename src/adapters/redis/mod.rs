//! Redis adapters - Production message transport.

mod message_bus;

pub use message_bus::RedisMessageBus;
