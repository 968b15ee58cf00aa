//! Axum routes for checkout endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::AppState;

use super::handlers::{create_checkout, get_customer_status, validate_user};

/// - `POST /checkout`
/// - `GET /customers/:id/status`
/// - `POST /validate-user`
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/validate-user", post(validate_user))
        .route("/customers/:id/status", get(get_customer_status))
}
