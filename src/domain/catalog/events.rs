//! Domain events raised by the product catalog.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, ProductId, Timestamp};
use crate::domain_event;

/// A new product was added to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreatedEvent {
    pub event_id: EventId,
    pub product_id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub category: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    ProductCreatedEvent,
    event_type = "product.created.v1",
    aggregate_id = product_id,
    aggregate_type = "Product",
    occurred_at = occurred_at,
    event_id = event_id
);

/// Product details (name, description, category, image) changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdatedEvent {
    pub event_id: EventId,
    pub product_id: ProductId,
    pub name: String,
    pub occurred_at: Timestamp,
}

domain_event!(
    ProductUpdatedEvent,
    event_type = "product.updated.v1",
    aggregate_id = product_id,
    aggregate_type = "Product",
    occurred_at = occurred_at,
    event_id = event_id
);

/// Product price changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceChangedEvent {
    pub event_id: EventId,
    pub product_id: ProductId,
    pub old_price_cents: i64,
    pub new_price_cents: i64,
    pub occurred_at: Timestamp,
}

domain_event!(
    ProductPriceChangedEvent,
    event_type = "product.price_changed.v1",
    aggregate_id = product_id,
    aggregate_type = "Product",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A customer rating was recorded and the running average moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRatingUpdatedEvent {
    pub event_id: EventId,
    pub product_id: ProductId,
    pub new_rating: f64,
    pub total_ratings: u32,
    pub occurred_at: Timestamp,
}

domain_event!(
    ProductRatingUpdatedEvent,
    event_type = "product.rating_updated.v1",
    aggregate_id = product_id,
    aggregate_type = "Product",
    occurred_at = occurred_at,
    event_id = event_id
);
