//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `STOREFRONT` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use storefront_events::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod outbox;
mod redis;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use outbox::OutboxConfig;
pub use redis::RedisConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (message transport)
    pub redis: RedisConfig,

    /// Outbox dispatcher configuration
    #[serde(default)]
    pub outbox: OutboxConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `STOREFRONT__DATABASE__URL=...` -> `database.url = ...`
    /// - `STOREFRONT__OUTBOX__BATCH_SIZE=50` -> `outbox.batch_size = 50`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STOREFRONT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.redis.validate()?;
        self.outbox.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "postgresql://localhost:5432/storefront".to_string(),
                ..Default::default()
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                ..Default::default()
            },
            outbox: OutboxConfig::default(),
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_section() {
        let mut config = valid_config();
        config.outbox.batch_size = 0;
        assert!(config.validate().is_err());
    }
}
