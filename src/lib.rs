//! Benefit Checkout - paid-subscription checkout for health-benefit plans.
//!
//! A checkout charges the customer through the payment gateway and records
//! the customer and subscription as a compensating saga. The gateway's
//! payment webhook later activates the subscription and publishes an
//! activation message; a queue worker enrolls the customer with the
//! plan's benefits provider.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
