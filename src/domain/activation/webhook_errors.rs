//! Webhook error types.
//!
//! Maps every failure of the activation trigger to the HTTP status the
//! gateway sees. 4xx/2xx stop gateway retries, 5xx invite them.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur while handling a payment notification.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signature header was sent.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature did not match the body.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The customer exists but has no subscription.
    #[error("Subscription not found for customer {0}")]
    SubscriptionNotFound(String),

    /// The subscription carries no plan reference.
    #[error("Subscription {0} has no plan")]
    MissingPlan(String),

    /// The referenced plan does not exist.
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// A store read or write failed.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl WebhookError {
    /// Returns true if the gateway should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Repository(_))
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::SubscriptionNotFound(_)
            | WebhookError::MissingPlan(_)
            | WebhookError::PlanNotFound(_)
            | WebhookError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::SubscriptionNotFound(_) => "SUBSCRIPTION_NOT_FOUND",
            WebhookError::MissingPlan(_) => "DATA_INTEGRITY_ERROR",
            WebhookError::PlanNotFound(_) => "PLAN_NOT_FOUND",
            WebhookError::Repository(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Repository(err.to_string())
    }
}
