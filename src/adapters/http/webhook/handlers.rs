//! HTTP handler for gateway payment notifications.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::application::handlers::activation::{HandlePaymentWebhookCommand, WebhookOutcome};
use crate::domain::activation::SIGNATURE_HEADER;

/// `200 OK` body for every acknowledged notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

impl From<&WebhookOutcome> for WebhookAck {
    fn from(outcome: &WebhookOutcome) -> Self {
        let outcome = match outcome {
            WebhookOutcome::Activated { .. } => "activated",
            WebhookOutcome::IgnoredEvent(_) => "ignored",
            WebhookOutcome::UnknownCustomer(_) => "unknown_customer",
            WebhookOutcome::Malformed => "malformed",
        };
        Self {
            received: true,
            outcome: outcome.to_string(),
        }
    }
}

/// POST /webhook - Handle a payment notification
///
/// The body is taken as raw bytes so the signature is checked over exactly
/// what was sent.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let outcome = state.webhook.handle(cmd).await?;

    Ok(Json(WebhookAck::from(&outcome)))
}
