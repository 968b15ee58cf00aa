use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{lock_poisoned, FaultSwitch};
use crate::domain::checkout::{digits_only, Customer, CustomerStatus};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, Timestamp};
use crate::ports::CustomerRepository;

const STORE: &str = "customers";

/// Customer store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryCustomerRepository {
    rows: RwLock<HashMap<CustomerId, Customer>>,
    faults: FaultSwitch,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations: `create`, `delete`, `find`, `exists`, `update_status`,
    /// `update_provider_id`.
    pub fn faults(&self) -> &FaultSwitch {
        &self.faults
    }

    /// Seeds a row without going through `create`.
    pub fn insert(&self, customer: Customer) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(customer.id, customer);
        }
    }

    pub fn all(&self) -> Vec<Customer> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    fn modify(
        &self,
        id: &CustomerId,
        apply: impl FnOnce(&mut Customer),
    ) -> Result<(), DomainError> {
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        let customer = rows.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::CustomerNotFound, format!("customer {} not found", id))
        })?;
        apply(customer);
        customer.updated_at = Timestamp::now();
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: &Customer) -> Result<(), DomainError> {
        self.faults.check(STORE, "create")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        if rows.contains_key(&customer.id) {
            return Err(DomainError::database(format!(
                "duplicate customer id {}",
                customer.id
            )));
        }
        rows.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn delete(&self, id: &CustomerId) -> Result<(), DomainError> {
        self.faults.check(STORE, "delete")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        self.faults.check(STORE, "find")?;
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows.get(id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, DomainError> {
        self.faults.check(STORE, "find")?;
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows
            .values()
            .find(|c| c.external_customer_id == external_id)
            .cloned())
    }

    async fn exists_by_email_or_cpf(&self, email: &str, cpf: &str) -> Result<bool, DomainError> {
        self.faults.check(STORE, "exists")?;
        let email = email.trim().to_lowercase();
        let cpf = digits_only(cpf);
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows.values().any(|c| {
            c.email.to_lowercase() == email || (!cpf.is_empty() && digits_only(&c.cpf) == cpf)
        }))
    }

    async fn update_status(
        &self,
        id: &CustomerId,
        status: CustomerStatus,
    ) -> Result<(), DomainError> {
        self.faults.check(STORE, "update_status")?;
        self.modify(id, |c| c.status = status)
    }

    async fn update_provider_id(
        &self,
        id: &CustomerId,
        provider_id: &str,
    ) -> Result<(), DomainError> {
        self.faults.check(STORE, "update_provider_id")?;
        self.modify(id, |c| c.provider_id = Some(provider_id.to_string()))
    }
}
