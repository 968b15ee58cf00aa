//! Payment gateway configuration (Asaas)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub api_key: SecretString,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Sandbox keys carry the `hmlg` marker.
    pub fn is_sandbox(&self) -> bool {
        self.api_key.expose_secret().contains("_hmlg_") || self.base_url.contains("sandbox")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("gateway.api_key"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl("gateway"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("gateway.timeout_secs"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.asaas.com/v3".to_string()
}

fn default_timeout() -> u64 {
    30
}
