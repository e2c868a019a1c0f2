//! Outbox dispatcher configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::events::DispatcherConfig;

/// Outbox dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum messages per poll cycle
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Failed attempts before a message is dead-lettered
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Days to keep processed messages before cleanup
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl OutboxConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get retention cutoff as Duration
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days as u64 * 86_400)
    }

    /// Build the dispatcher's configuration value object
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::default()
            .with_poll_interval(self.poll_interval())
            .with_batch_size(self.batch_size)
            .with_max_retries(self.max_retries)
    }

    /// Validate outbox configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.max_retries == 0 {
            return Err(ValidationError::InvalidMaxRetries);
        }
        Ok(())
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_poll_interval() -> u64 {
    10
}

fn default_batch_size() -> u32 {
    20
}

fn default_max_retries() -> u32 {
    5
}

fn default_retention_days() -> u32 {
    30
}
