//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Commands (checkout, webhook, enrollment, expiry) and the status query
//! each have their own handler.

pub mod handlers;

pub use handlers::*;
