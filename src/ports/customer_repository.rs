//! Customer repository port.
//!
//! CRUD contract only; no business rules live behind it.

use crate::domain::checkout::{Customer, CustomerStatus};
use crate::domain::foundation::{CustomerId, DomainError};
use async_trait::async_trait;

/// Repository port for customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Inserts a new customer.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn create(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Deletes a customer. Deleting a missing row is not an error.
    async fn delete(&self, id: &CustomerId) -> Result<(), DomainError>;

    /// Finds a customer by id.
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError>;

    /// Finds a customer by the gateway's customer id.
    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<Customer>, DomainError>;

    /// True when any customer already uses `email` or `cpf`.
    ///
    /// `email` is compared case-insensitively and `cpf` by digits only.
    async fn exists_by_email_or_cpf(&self, email: &str, cpf: &str) -> Result<bool, DomainError>;

    /// Sets the lifecycle status.
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if no row matches
    async fn update_status(&self, id: &CustomerId, status: CustomerStatus)
        -> Result<(), DomainError>;

    /// Records the beneficiary id assigned by the benefits provider.
    async fn update_provider_id(&self, id: &CustomerId, provider_id: &str)
        -> Result<(), DomainError>;
}
