//! Benefits provider port.
//!
//! One implementation per external benefits system. The activation worker
//! selects an implementation by the message's provider code.

use crate::domain::activation::ActivationMessage;
use crate::domain::checkout::ProviderCode;
use async_trait::async_trait;
use thiserror::Error;

/// Result of a successful enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    /// Beneficiary id on the provider side, stored on the customer.
    pub provider_member_id: String,
}

/// Enrollment failures. Every variant sends the message to the dead-letter queue.
#[derive(Debug, Clone, Error)]
pub enum EnrollmentError {
    #[error("provider authentication failed: {0}")]
    Authentication(String),

    #[error("provider rejected enrollment ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("provider request timed out")]
    Timeout,

    #[error("provider unreachable: {0}")]
    Network(String),

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Port for enrolling a paying customer with their benefits provider.
#[async_trait]
pub trait BenefitProvider: Send + Sync {
    /// Code of the provider this implementation talks to.
    fn code(&self) -> ProviderCode;

    /// Enrolls the customer described by `message`.
    async fn enroll(&self, message: &ActivationMessage) -> Result<Enrollment, EnrollmentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benefit_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn BenefitProvider) {}
    }

    #[test]
    fn rejection_display_includes_status() {
        let err = EnrollmentError::Rejected {
            status: 422,
            body: "cpf duplicado".to_string(),
        };
        assert_eq!(err.to_string(), "provider rejected enrollment (422): cpf duplicado");
    }
}
