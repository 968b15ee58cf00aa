//! Per-IP request limits for public endpoints

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Lead captures accepted from one IP per window
    #[serde(default = "default_lead_requests")]
    pub lead_requests_per_window: u32,

    #[serde(default = "default_window")]
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.lead_requests_per_window == 0 {
            return Err(ValidationError::InvalidRateLimit("lead_requests_per_window"));
        }
        if self.window_secs == 0 {
            return Err(ValidationError::InvalidRateLimit("window_secs"));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            lead_requests_per_window: default_lead_requests(),
            window_secs: default_window(),
        }
    }
}

fn default_lead_requests() -> u32 {
    10
}

fn default_window() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.lead_requests_per_window, 10);
        assert_eq!(config.window(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = RateLimitConfig {
            lead_requests_per_window: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRateLimit("lead_requests_per_window"))
        );
    }
}
