//! Readiness probe port.

use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// A dependency the service cannot serve traffic without.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Short name reported when the check fails.
    fn name(&self) -> &'static str;

    /// Returns `Ok` when the dependency answers.
    async fn check(&self) -> Result<(), DomainError>;
}
