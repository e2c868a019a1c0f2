//! Product aggregate.

use crate::domain::foundation::{
    AggregateRoot, DomainError, EventEnvelope, EventId, PendingEvents, ProductId, Timestamp,
    ValidationError,
};

use super::events::{
    ProductCreatedEvent, ProductPriceChangedEvent, ProductRatingUpdatedEvent, ProductUpdatedEvent,
};

/// A catalog product.
///
/// Business operations record domain events into the pending list; the
/// events are harvested at commit time and cleared once they are durably
/// in the outbox.
#[derive(Debug, Clone)]
pub struct Product {
    id: ProductId,
    name: String,
    price_cents: i64,
    description: String,
    category: String,
    image_url: String,
    rating: f64,
    rating_count: u32,
    created_at: Timestamp,
    updated_at: Timestamp,
    events: PendingEvents,
}

impl Product {
    /// Creates a new product, raising `product.created.v1`.
    pub fn create(
        name: impl Into<String>,
        price_cents: i64,
        description: impl Into<String>,
        category: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let image_url = image_url.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        if price_cents <= 0 {
            return Err(ValidationError::out_of_range("price_cents", 1, i64::MAX, price_cents).into());
        }
        validate_image_url(&image_url)?;

        let now = Timestamp::now();
        let mut product = Self {
            id: ProductId::new(),
            name: name.clone(),
            price_cents,
            description: description.into(),
            category: category.into(),
            image_url,
            rating: 0.0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
            events: PendingEvents::new(),
        };

        let event = ProductCreatedEvent {
            event_id: EventId::new(),
            product_id: product.id,
            name,
            price_cents,
            category: product.category.clone(),
            occurred_at: now,
        };
        product.events.record(EventEnvelope::from_event(&event));

        Ok(product)
    }

    /// Updates the descriptive fields, raising `product.updated.v1`.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Result<(), DomainError> {
        let name = name.into();
        let image_url = image_url.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        validate_image_url(&image_url)?;

        self.name = name.clone();
        self.description = description.into();
        self.category = category.into();
        self.image_url = image_url;
        self.updated_at = Timestamp::now();

        let event = ProductUpdatedEvent {
            event_id: EventId::new(),
            product_id: self.id,
            name,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    /// Changes the price, raising `product.price_changed.v1`.
    ///
    /// Setting the same price is a no-op and raises nothing.
    pub fn change_price(&mut self, new_price_cents: i64) -> Result<(), DomainError> {
        if new_price_cents <= 0 {
            return Err(
                ValidationError::out_of_range("price_cents", 1, i64::MAX, new_price_cents).into(),
            );
        }
        if new_price_cents == self.price_cents {
            return Ok(());
        }

        let old_price_cents = self.price_cents;
        self.price_cents = new_price_cents;
        self.updated_at = Timestamp::now();

        let event = ProductPriceChangedEvent {
            event_id: EventId::new(),
            product_id: self.id,
            old_price_cents,
            new_price_cents,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    /// Records a customer rating (1-5), raising `product.rating_updated.v1`.
    pub fn rate(&mut self, score: u8) -> Result<(), DomainError> {
        if !(1..=5).contains(&score) {
            return Err(ValidationError::out_of_range("score", 1, 5, score as i64).into());
        }

        let total = self.rating * self.rating_count as f64 + score as f64;
        self.rating_count += 1;
        self.rating = total / self.rating_count as f64;
        self.updated_at = Timestamp::now();

        let event = ProductRatingUpdatedEvent {
            event_id: EventId::new(),
            product_id: self.id,
            new_rating: self.rating,
            total_ratings: self.rating_count,
            occurred_at: self.updated_at,
        };
        self.events.record(EventEnvelope::from_event(&event));

        Ok(())
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn rating_count(&self) -> u32 {
        self.rating_count
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

fn validate_image_url(image_url: &str) -> Result<(), ValidationError> {
    if !image_url.starts_with("http://") && !image_url.starts_with("https://") {
        return Err(ValidationError::invalid_format(
            "image_url",
            "must be an http(s) URL",
        ));
    }
    Ok(())
}

impl AggregateRoot for Product {
    fn aggregate_type(&self) -> &'static str {
        "Product"
    }

    fn pending_events(&self) -> &[EventEnvelope] {
        self.events.as_slice()
    }

    fn clear_pending_events(&mut self) {
        self.events.clear();
    }
}
