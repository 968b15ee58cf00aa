//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps and the error vocabulary shared by the
//! checkout and activation modules.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CustomerId, DependentId, PlanId, SubscriptionId};
pub use timestamp::Timestamp;
