//! Rate limiting port for public endpoints.
//!
//! Limits are fixed windows counted per key. Implementations must be safe to
//! call concurrently from every request task.

use async_trait::async_trait;
use std::fmt;

/// Port for rate limiting operations.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key` and reports whether it may proceed.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Identifier within the scope (e.g., IP address).
    pub identifier: String,
    /// Endpoint family the limit applies to (e.g., "leads").
    pub resource: String,
}

/// The scope at which rate limiting is applied.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum RateLimitScope {
    /// Per client IP address.
    Ip,
}

impl RateLimitKey {
    /// Creates an IP-based key for `resource`.
    pub fn ip(ip: &str, resource: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Flat string form, e.g. `ratelimit:ip:10.0.0.1:leads`.
    pub fn as_key(&self) -> String {
        format!(
            "ratelimit:{}:{}:{}",
            self.scope.as_str(),
            self.identifier,
            self.resource
        )
    }
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Ip => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed; `remaining` requests are left in the window.
    Allowed { limit: u32, remaining: u32 },
    /// Request is denied.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Details of a rate limit denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDenied {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    pub scope: RateLimitScope,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_key_has_correct_scope() {
        let key = RateLimitKey::ip("192.168.1.1", "leads");
        assert_eq!(key.scope, RateLimitScope::Ip);
        assert_eq!(key.identifier, "192.168.1.1");
        assert_eq!(key.resource, "leads");
    }

    #[test]
    fn key_format_includes_resource() {
        let key = RateLimitKey::ip("10.0.0.1", "leads");
        assert_eq!(key.as_key(), "ratelimit:ip:10.0.0.1:leads");
    }

    #[test]
    fn rate_limiter_is_object_safe() {
        fn _accepts_dyn(_limiter: &dyn RateLimiter) {}
    }
}
