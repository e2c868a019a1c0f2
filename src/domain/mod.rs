//! Domain layer - aggregates, domain events, and the outbox model.

pub mod cart;
pub mod catalog;
pub mod foundation;
pub mod outbox;

use outbox::EventTypeRegistry;

/// Builds the registry of every event type the platform publishes.
///
/// Called once at startup; the dispatcher resolves stored discriminators
/// against this map. A new event type must be registered here or its outbox
/// messages will dead-letter with `UNKNOWN_EVENT_TYPE`.
pub fn event_registry() -> EventTypeRegistry {
    let mut registry = EventTypeRegistry::new();

    registry.register::<catalog::ProductCreatedEvent>("product.created.v1");
    registry.register::<catalog::ProductUpdatedEvent>("product.updated.v1");
    registry.register::<catalog::ProductPriceChangedEvent>("product.price_changed.v1");
    registry.register::<catalog::ProductRatingUpdatedEvent>("product.rating_updated.v1");

    registry.register::<cart::CartItemAddedEvent>("cart.item_added.v1");
    registry.register::<cart::CartItemRemovedEvent>("cart.item_removed.v1");
    registry.register::<cart::CartItemQuantityChangedEvent>("cart.item_quantity_changed.v1");
    registry.register::<cart::CartClearedEvent>("cart.cleared.v1");

    registry
}
