//! Adapters - Implementations of port interfaces.
//!
//! - `gateway` - Asaas payment gateway and a scripted mock
//! - `doc24` - Doc24 benefits provider
//! - `postgres` - repositories over `sqlx`
//! - `memory` - in-process repositories for tests and local runs
//! - `queue` - activation queue brokers, producer and worker
//! - `rate_limiter` - per-IP request limits
//! - `scheduler` - PIX expiration sweep
//! - `validation` - rule-based checkout validator
//! - `http` - axum routes

pub mod doc24;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod queue;
pub mod rate_limiter;
pub mod scheduler;
pub mod validation;
