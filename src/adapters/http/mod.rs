//! HTTP adapters - REST API implementations.
//!
//! All routes share one [`AppState`] holding the application handlers.

pub mod checkout;
pub mod error;
pub mod extract;
pub mod health;
pub mod leads;
pub mod middleware;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::handlers::activation::HandlePaymentWebhookHandler;
use crate::application::handlers::checkout::{
    CaptureLeadHandler, GetCustomerStatusHandler, ProcessCheckoutHandler, ValidateUserHandler,
};
use crate::ports::{RateLimiter, ReadinessCheck};

pub use error::{ApiError, ErrorResponse};
pub use extract::JsonBody;

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub checkout: Arc<ProcessCheckoutHandler>,
    pub customer_status: Arc<GetCustomerStatusHandler>,
    pub validate_user: Arc<ValidateUserHandler>,
    pub capture_lead: Arc<CaptureLeadHandler>,
    /// Per-IP limit on `POST /leads/capture`.
    pub lead_limiter: Arc<dyn RateLimiter>,
    pub webhook: Arc<HandlePaymentWebhookHandler>,
    pub readiness: Arc<Vec<Arc<dyn ReadinessCheck>>>,
}

/// Builds the full API router with tracing and a request timeout.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let lead_limiter = state.lead_limiter.clone();
    Router::new()
        .merge(checkout::checkout_routes())
        .merge(leads::lead_routes(lead_limiter))
        .merge(webhook::webhook_routes())
        .merge(health::health_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
