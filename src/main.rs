//! Outbox dispatcher service entry point.
//!
//! Loads configuration, connects to PostgreSQL and Redis, and runs the
//! dispatcher loop until SIGINT.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use storefront_events::adapters::{OutboxDispatcher, PostgresOutboxStore, RedisMessageBus};
use storefront_events::config::AppConfig;
use storefront_events::domain::event_registry;
use storefront_events::ports::{Clock, MessageBus, OutboxStore, SystemClock};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn OutboxStore> = Arc::new(
        PostgresOutboxStore::new(pool, clock.clone()).with_max_retries(config.outbox.max_retries),
    );
    let bus: Arc<dyn MessageBus> = Arc::new(
        RedisMessageBus::connect(&config.redis.url)
            .await?
            .with_channel_prefix(config.redis.channel_prefix.clone()),
    );
    let registry = Arc::new(event_registry());

    let dispatcher = Arc::new(OutboxDispatcher::with_config(
        store,
        bus,
        registry,
        clock,
        config.outbox.dispatcher_config(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.run(shutdown_rx).await }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown_tx.send(true)?;
    worker.await?;

    Ok(())
}
