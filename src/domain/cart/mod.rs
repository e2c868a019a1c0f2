//! Shopping cart domain.

mod cart;
mod events;

pub use cart::{Cart, CartItem};
pub use events::{
    CartClearedEvent, CartItemAddedEvent, CartItemQuantityChangedEvent, CartItemRemovedEvent,
};
