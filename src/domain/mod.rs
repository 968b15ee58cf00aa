//! Domain layer - entities, value objects and business rules.

pub mod activation;
pub mod checkout;
pub mod foundation;
