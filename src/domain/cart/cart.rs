//! Shopping cart aggregate.

use crate::domain::foundation::{
    AggregateRoot, CartId, DomainError, ErrorCode, EventEnvelope, EventId, PendingEvents,
    ProductId, Timestamp, ValidationError,
};

use super::events::{
    CartClearedEvent, CartItemAddedEvent, CartItemQuantityChangedEvent, CartItemRemovedEvent,
};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// A customer's shopping cart.
#[derive(Debug, Clone)]
pub struct Cart {
    id: CartId,
    user_id: String,
    items: Vec<CartItem>,
    created_at: Timestamp,
    updated_at: Timestamp,
    events: PendingEvents,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: CartId::new(),
            user_id: user_id.into(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            events: PendingEvents::new(),
        }
    }

    /// Adds a product to the cart, raising `cart.item_added.v1`.
    ///
    /// Adding a product that is already in the cart merges quantities and
    /// raises `cart.item_quantity_changed.v1` instead.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        unit_price_cents: i64,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(ValidationError::out_of_range("quantity", 1, u32::MAX as i64, 0).into());
        }

        if let Some(existing) = self.items.iter().position(|i| i.product_id == product_id) {
            let old_quantity = self.items[existing].quantity;
            return self.change_quantity(product_id, old_quantity + quantity);
        }

        self.items.push(CartItem {
            product_id,
            quantity,
            unit_price_cents,
        });
        self.updated_at = Timestamp::now();

        let event = CartItemAddedEvent {
            event_id: EventId::new(),
            cart_id: self.id,
            product_id,
            quantity,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    /// Removes a product from the cart, raising `cart.item_removed.v1`.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), DomainError> {
        let position = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CartItemNotFound,
                    format!("Product {} is not in the cart", product_id),
                )
            })?;

        self.items.remove(position);
        self.updated_at = Timestamp::now();

        let event = CartItemRemovedEvent {
            event_id: EventId::new(),
            cart_id: self.id,
            product_id,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    /// Sets the quantity of a line, raising `cart.item_quantity_changed.v1`.
    pub fn change_quantity(
        &mut self,
        product_id: ProductId,
        new_quantity: u32,
    ) -> Result<(), DomainError> {
        if new_quantity == 0 {
            return Err(ValidationError::out_of_range("quantity", 1, u32::MAX as i64, 0).into());
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CartItemNotFound,
                    format!("Product {} is not in the cart", product_id),
                )
            })?;

        let old_quantity = item.quantity;
        item.quantity = new_quantity;
        self.updated_at = Timestamp::now();

        let event = CartItemQuantityChangedEvent {
            event_id: EventId::new(),
            cart_id: self.id,
            product_id,
            old_quantity,
            new_quantity,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    /// Empties the cart, raising `cart.cleared.v1`.
    ///
    /// Clearing an already-empty cart is a no-op and raises nothing.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }

        self.items.clear();
        self.updated_at = Timestamp::now();

        let event = CartClearedEvent {
            event_id: EventId::new(),
            cart_id: self.id,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cart total in cents.
    pub fn total_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.unit_price_cents * i.quantity as i64)
            .sum()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

impl AggregateRoot for Cart {
    fn aggregate_type(&self) -> &'static str {
        "Cart"
    }

    fn pending_events(&self) -> &[EventEnvelope] {
        self.events.as_slice()
    }

    fn clear_pending_events(&mut self) {
        self.events.clear();
    }
}
