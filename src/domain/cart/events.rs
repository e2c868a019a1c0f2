//! Domain events raised by the shopping cart.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CartId, EventId, ProductId, Timestamp};
use crate::domain_event;

/// A product was added to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemAddedEvent {
    pub event_id: EventId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: Timestamp,
}

domain_event!(
    CartItemAddedEvent,
    event_type = "cart.item_added.v1",
    aggregate_id = cart_id,
    aggregate_type = "Cart",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A product was removed from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemRemovedEvent {
    pub event_id: EventId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub occurred_at: Timestamp,
}

domain_event!(
    CartItemRemovedEvent,
    event_type = "cart.item_removed.v1",
    aggregate_id = cart_id,
    aggregate_type = "Cart",
    occurred_at = occurred_at,
    event_id = event_id
);

/// The quantity of a cart line changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemQuantityChangedEvent {
    pub event_id: EventId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub old_quantity: u32,
    pub new_quantity: u32,
    pub occurred_at: Timestamp,
}

domain_event!(
    CartItemQuantityChangedEvent,
    event_type = "cart.item_quantity_changed.v1",
    aggregate_id = cart_id,
    aggregate_type = "Cart",
    occurred_at = occurred_at,
    event_id = event_id
);

/// All items were removed from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartClearedEvent {
    pub event_id: EventId,
    pub cart_id: CartId,
    pub occurred_at: Timestamp,
}

domain_event!(
    CartClearedEvent,
    event_type = "cart.cleared.v1",
    aggregate_id = cart_id,
    aggregate_type = "Cart",
    occurred_at = occurred_at,
    event_id = event_id
);
