//! Lead repository port.

use crate::domain::checkout::Lead;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Repository port for captured leads.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Inserts the lead, or refreshes the stored one with the same email.
    ///
    /// A `None` field keeps the stored value.
    async fn upsert(&self, lead: &Lead) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn LeadRepository) {}
    }
}
