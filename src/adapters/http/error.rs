//! Shared HTTP error body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::activation::WebhookError;
use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::ErrorCode;

/// `{"error": CODE, "message": text}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Checkout(CheckoutError),
    Webhook(WebhookError),
    /// Request body that is not JSON or does not fit the expected shape.
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Checkout(err) => {
                let status = if err.is_domain() {
                    StatusCode::BAD_REQUEST
                } else {
                    tracing::error!(error = %err, "checkout failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, ErrorResponse::new(err.code().to_string(), err.message()))
            }
            ApiError::Webhook(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    tracing::error!(error = %err, "webhook activation failed");
                }
                (status, ErrorResponse::new(err.code(), err.to_string()))
            }
            ApiError::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationFailed.to_string(), message.clone()),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_checkout_errors_are_bad_request() {
        let response = ApiError::from(CheckoutError::payment_failed("declined")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn technical_checkout_errors_are_server_errors() {
        let response =
            ApiError::from(CheckoutError::persistence("persist_customer", "down")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_body_is_validation_failure() {
        let response = ApiError::InvalidBody("expected a string".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn signature_errors_are_unauthorized() {
        let response = ApiError::from(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
