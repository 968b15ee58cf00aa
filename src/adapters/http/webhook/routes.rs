//! Axum routes for the payment webhook.

use axum::routing::post;
use axum::Router;

use crate::adapters::http::AppState;

use super::handlers::handle_payment_webhook;

/// - `POST /webhook` (no auth, signature verified)
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}
