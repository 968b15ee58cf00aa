//! Rate limiter adapters.
//!
//! - `InMemoryRateLimiter` - fixed-window counters held by this process

mod in_memory;

pub use in_memory::InMemoryRateLimiter;
