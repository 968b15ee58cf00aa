//! Payment gateway port.
//!
//! The checkout saga only needs three capabilities from the gateway: register
//! the payer, create a recurring card charge, and create a recurring PIX
//! charge. Cancelling a gateway subscription backs the saga's compensation
//! for an already-issued charge.
//!
//! # Design
//!
//! - **Gateway agnostic**: amounts are integer cents, ids are opaque strings
//! - **Fail closed**: every error aborts the checkout before anything is persisted
//! - **Bounded**: implementations apply a request timeout and report it as `Timeout`

use crate::domain::checkout::CardForm;
use crate::domain::foundation::{DomainError, ErrorCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for the recurring-payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers the payer and returns the gateway's customer id.
    async fn create_customer(&self, profile: &GatewayCustomer) -> Result<String, PaymentError>;

    /// Creates a monthly card subscription.
    async fn subscribe(&self, request: &CardSubscriptionRequest)
        -> Result<GatewaySubscription, PaymentError>;

    /// Creates a monthly PIX subscription and returns the first charge's
    /// copy-paste code and QR image.
    async fn subscribe_pix(&self, request: &PixSubscriptionRequest)
        -> Result<PixSubscription, PaymentError>;

    /// Cancels a subscription created by this gateway.
    async fn cancel_subscription(&self, external_subscription_id: &str) -> Result<(), PaymentError>;
}

/// Payer profile sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub name: String,
    pub email: String,
    /// CPF, digits only.
    pub cpf_cnpj: String,
    pub phone: String,
    pub postal_code: String,
    pub address_number: String,
}

/// Card subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSubscriptionRequest {
    /// Gateway customer id returned by `create_customer`.
    pub external_customer_id: String,

    /// Monthly amount in cents.
    pub amount_cents: i64,

    /// Card to charge.
    pub card: CardForm,

    /// Card holder data the gateway requires for anti-fraud checks.
    pub holder: GatewayCustomer,
}

/// PIX subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixSubscriptionRequest {
    /// Gateway customer id returned by `create_customer`.
    pub external_customer_id: String,

    /// Monthly amount in cents.
    pub amount_cents: i64,
}

/// Card subscription as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySubscription {
    /// Gateway's subscription id.
    pub id: String,

    /// Gateway-reported status, passed through to the caller.
    pub status: String,
}

/// Payment artifact the caller shows to the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixArtifact {
    /// Copy-and-paste PIX code.
    pub copy_paste: String,

    /// QR code image (URL or data URI).
    pub qr_code_url: String,
}

/// PIX subscription as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixSubscription {
    /// Gateway's subscription id.
    pub id: String,

    /// First charge's PIX artifact.
    pub pix: PixArtifact,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Gateway's own error code (if available).
    pub provider_code: Option<String>,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CardDeclined, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    /// True when retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(ErrorCode::PaymentFailed, err.message)
            .with_detail("payment_error", err.code.to_string())
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// The gateway did not answer within the configured timeout.
    Timeout,

    /// API key rejected.
    AuthenticationError,

    /// Card was declined.
    CardDeclined,

    /// Gateway rejected the request payload.
    InvalidRequest,

    /// Gateway-side failure or unexpected response.
    ProviderError,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentErrorCode::NetworkError | PaymentErrorCode::Timeout)
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::CardDeclined => "card_declined",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(PaymentError::network("reset").is_retryable());
        assert!(PaymentError::timeout("30s").is_retryable());
        assert!(!PaymentError::card_declined("no").is_retryable());
    }

    #[test]
    fn payment_error_display() {
        let err = PaymentError::card_declined("Your card was declined");
        assert_eq!(err.to_string(), "card_declined: Your card was declined");
    }

    #[test]
    fn payment_error_converts_to_payment_failed() {
        let domain_err: DomainError = PaymentError::invalid_request("bad cpf").into();
        assert_eq!(domain_err.code, ErrorCode::PaymentFailed);
        assert_eq!(
            domain_err.details.get("payment_error"),
            Some(&"invalid_request".to_string())
        );
    }
}
