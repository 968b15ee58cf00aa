//! PIX payment window and expiration sweep

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PixConfig {
    /// Minutes a PIX charge may stay unpaid
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl PixConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_minutes * 60)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.expiration_minutes == 0 {
            return Err(ValidationError::InvalidPixWindow("expiration_minutes"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidPixWindow("sweep_interval_secs"));
        }
        Ok(())
    }
}

impl Default for PixConfig {
    fn default() -> Self {
        Self {
            expiration_minutes: default_expiration_minutes(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_expiration_minutes() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    60
}
