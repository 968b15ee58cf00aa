//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `BENEFIT_CHECKOUT`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use benefit_checkout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod doc24;
mod error;
mod gateway;
mod pix;
mod queue;
mod rate_limit;
mod redis;
mod server;
mod webhook;

pub use database::DatabaseConfig;
pub use doc24::Doc24Settings;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use pix::PixConfig;
pub use queue::QueueConfig;
pub use rate_limit::RateLimitConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Redis backing the activation queue
    pub redis: RedisConfig,

    /// Activation queue topology names
    #[serde(default)]
    pub queue: QueueConfig,

    /// Payment gateway (Asaas)
    pub gateway: GatewayConfig,

    pub webhook: WebhookConfig,

    /// Benefits provider (Doc24)
    pub doc24: Doc24Settings,

    #[serde(default)]
    pub pix: PixConfig,

    /// Per-IP limits on public endpoints
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `BENEFIT_CHECKOUT__*` variables:
    ///
    /// - `BENEFIT_CHECKOUT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BENEFIT_CHECKOUT__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or cannot be
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BENEFIT_CHECKOUT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.queue.validate()?;
        self.gateway.validate()?;
        self.webhook.validate(self.server.environment)?;
        self.doc24.validate()?;
        self.pix.validate()?;
        self.rate_limit.validate()?;
        // A delivery must not be reclaimed while its enrollment call is still running.
        if self.redis.visibility_timeout() <= self.doc24.timeout() {
            return Err(ValidationError::VisibilityTimeoutTooShort);
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
