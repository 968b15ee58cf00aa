//! Redis configuration (activation queue broker)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Connect timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long one worker receive blocks before re-checking shutdown
    #[serde(default = "default_consumer_block")]
    pub consumer_block_secs: u64,

    /// Key namespace for queue data
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Seconds a delivery may stay unsettled before it is handed out again
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn consumer_block(&self) -> Duration {
        Duration::from_secs(self.consumer_block_secs)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("redis.url"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.consumer_block_secs == 0 {
            return Err(ValidationError::InvalidTimeout("redis.consumer_block_secs"));
        }
        if self.visibility_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("redis.visibility_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout(),
            consumer_block_secs: default_consumer_block(),
            key_prefix: default_key_prefix(),
            visibility_timeout_secs: default_visibility_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_consumer_block() -> u64 {
    5
}

fn default_key_prefix() -> String {
    "benefit".to_string()
}

fn default_visibility_timeout() -> u64 {
    300
}
