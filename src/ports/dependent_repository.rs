//! Dependent repository port.

use crate::domain::checkout::Dependent;
use crate::domain::foundation::{CustomerId, DomainError};
use async_trait::async_trait;

/// Repository port for dependents.
#[async_trait]
pub trait DependentRepository: Send + Sync {
    /// Inserts all dependents, or none of them.
    async fn create_many(&self, dependents: &[Dependent]) -> Result<(), DomainError>;

    /// Removes every dependent of a customer.
    async fn delete_by_customer(&self, customer_id: &CustomerId) -> Result<(), DomainError>;

    /// Lists the dependents of a customer.
    async fn find_by_customer(&self, customer_id: &CustomerId)
        -> Result<Vec<Dependent>, DomainError>;
}
