//! Per-IP rate limiting middleware for axum.
//!
//! Checks the `RateLimiter` port before the handler runs. Limit status is
//! returned in headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! A limiter error lets the request through.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::error::ErrorResponse;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimiter};

/// Error code answered with `429`.
pub const RATE_LIMITED_CODE: &str = "RATE_LIMITED";

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Limiter plus the resource name its keys are scoped to.
#[derive(Clone)]
pub struct RateLimitPolicy {
    pub limiter: Arc<dyn RateLimiter>,
    pub resource: &'static str,
}

impl RateLimitPolicy {
    pub fn new(limiter: Arc<dyn RateLimiter>, resource: &'static str) -> Self {
        Self { limiter, resource }
    }
}

/// Rejects a client IP that exceeded the policy's window with `429`.
///
/// Requests without a resolvable client IP are not limited.
pub async fn rate_limit_by_ip(
    State(policy): State<RateLimitPolicy>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(client_ip) = client_ip(request.headers(), connect_info.as_ref()) else {
        return next.run(request).await;
    };

    let key = RateLimitKey::ip(&client_ip, policy.resource);
    match policy.limiter.check(key).await {
        Ok(RateLimitResult::Denied(denied)) => {
            tracing::warn!(
                client_ip = %client_ip,
                resource = policy.resource,
                retry_after_secs = denied.retry_after_secs,
                "rate limit exceeded"
            );
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new(
                    RATE_LIMITED_CODE,
                    "Too many requests. Please try again later.",
                )),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(denied.limit));
            headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
            headers.insert(RETRY_AFTER, HeaderValue::from(denied.retry_after_secs));
            response
        }
        Ok(RateLimitResult::Allowed { limit, remaining }) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "rate limiter unavailable, allowing request");
            next.run(request).await
        }
    }
}

/// Client IP, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|h| h.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').map(str::trim).find(|ip| !ip.is_empty()) {
            return Some(first_ip.to_string());
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return Some(real_ip.to_string());
        }
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}
