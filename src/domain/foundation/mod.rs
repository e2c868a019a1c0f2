//! Foundation types shared by every domain module.

mod aggregate;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use aggregate::{AggregateRoot, PendingEvents};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata};
pub use ids::{CartId, ProductId};
pub use timestamp::Timestamp;
