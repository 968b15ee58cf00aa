//! Axum routes for lead capture.

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::Router;

use crate::adapters::http::middleware::{rate_limit_by_ip, RateLimitPolicy};
use crate::adapters::http::AppState;
use crate::ports::RateLimiter;

use super::handlers::capture_lead;

/// Resource name lead capture limits are keyed under.
pub const LEADS_RESOURCE: &str = "leads";

/// - `POST /leads/capture` (rate limited per client IP)
pub fn lead_routes(limiter: Arc<dyn RateLimiter>) -> Router<AppState> {
    Router::new()
        .route("/leads/capture", post(capture_lead))
        .route_layer(from_fn_with_state(
            RateLimitPolicy::new(limiter, LEADS_RESOURCE),
            rate_limit_by_ip,
        ))
}
