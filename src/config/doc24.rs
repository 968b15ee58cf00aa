//! Doc24 provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct Doc24Settings {
    pub client_id: String,

    pub client_secret: SecretString,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Company the affiliates are registered under
    #[serde(default = "default_empresa")]
    pub empresa: String,

    /// Used when a plan carries no provider plan code
    #[serde(default = "default_plan_code")]
    pub default_plan_code: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Doc24Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("doc24.client_id"));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("doc24.client_secret"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl("doc24"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("doc24.timeout_secs"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://tapi.doc24.com.ar/ws/api/v2".to_string()
}

fn default_empresa() -> String {
    "Ag Med".to_string()
}

fn default_plan_code() -> String {
    "ligue saude em dia individual".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_client_id() {
        let settings = Doc24Settings {
            client_id: String::new(),
            client_secret: SecretString::new("s".to_string()),
            base_url: default_base_url(),
            empresa: default_empresa(),
            default_plan_code: default_plan_code(),
            timeout_secs: 30,
        };
        assert_eq!(
            settings.validate(),
            Err(ValidationError::MissingRequired("doc24.client_id"))
        );
    }
}
