//! In-memory rate limiter.
//!
//! Uses a fixed-window counter per key. Counters live in this process, so
//! each replica enforces its own limit.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::ports::{RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimiter};

/// Windows kept before expired ones are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Fixed-window rate limiter for single-server deployments and tests.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    limit: u32,
    window: Duration,
    windows: RwLock<HashMap<String, WindowState>>,
}

impl InMemoryRateLimiter {
    /// Allows `limit` requests per key in every `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Lead capture limits from configuration.
    pub fn for_leads(config: &RateLimitConfig) -> Self {
        Self::new(config.lead_requests_per_window, config.window())
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        if windows.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, state| now.duration_since(state.window_start) < window);
        }

        let state = windows.entry(key.as_key()).or_insert_with(|| WindowState {
            count: 0,
            window_start: now,
        });

        // Check if window has expired
        if now.duration_since(state.window_start) >= self.window {
            state.count = 0;
            state.window_start = now;
        }

        if state.count >= self.limit {
            let elapsed = now.duration_since(state.window_start);
            let retry_after = self.window.saturating_sub(elapsed).as_secs();
            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit: self.limit,
                retry_after_secs: u32::try_from(retry_after).unwrap_or(u32::MAX).max(1),
                scope: key.scope,
            }));
        }

        state.count += 1;
        Ok(RateLimitResult::Allowed {
            limit: self.limit,
            remaining: self.limit.saturating_sub(state.count),
        })
    }
}
