//! Storefront Events - Transactional outbox and reliable event dispatch
//!
//! This crate guarantees that a domain event raised while mutating business
//! state is never silently lost: events are written to a durable outbox in
//! the same transaction as the state change, then published asynchronously
//! with bounded, backed-off retries and a terminal dead-letter state.
//! Delivery is at-least-once; consumers must be idempotent.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
