//! Webhook signature configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::activation::SignatureMode;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC-SHA256 key
    pub secret: SecretString,

    /// Let requests without a signature header through. Rejected in production.
    #[serde(default)]
    pub allow_unsigned: bool,
}

impl WebhookConfig {
    pub fn signature_mode(&self) -> SignatureMode {
        if self.allow_unsigned {
            SignatureMode::AllowUnsigned
        } else {
            SignatureMode::Required
        }
    }

    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("webhook.secret"));
        }
        if self.allow_unsigned && environment == Environment::Production {
            return Err(ValidationError::UnsignedWebhooksInProduction);
        }
        Ok(())
    }
}
