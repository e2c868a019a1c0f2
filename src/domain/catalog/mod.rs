//! Product catalog domain.

mod events;
mod product;

pub use events::{
    ProductCreatedEvent, ProductPriceChangedEvent, ProductRatingUpdatedEvent, ProductUpdatedEvent,
};
pub use product::Product;
