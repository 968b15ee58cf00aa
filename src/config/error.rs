//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Queue name must not be empty: {0}")]
    EmptyQueueName(&'static str),

    #[error("Dead-letter queue must differ from the work queue")]
    DeadLetterQueueCollision,

    #[error("{0} base URL must be http(s)")]
    InvalidBaseUrl(&'static str),

    #[error("Unsigned webhooks cannot be allowed in production")]
    UnsignedWebhooksInProduction,

    #[error("PIX {0} must be greater than zero")]
    InvalidPixWindow(&'static str),

    #[error("Queue visibility timeout must exceed the provider request timeout")]
    VisibilityTimeoutTooShort,

    #[error("Rate limit {0} must be greater than zero")]
    InvalidRateLimit(&'static str),
}
