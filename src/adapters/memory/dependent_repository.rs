use async_trait::async_trait;
use std::sync::RwLock;

use super::{lock_poisoned, FaultSwitch};
use crate::domain::checkout::Dependent;
use crate::domain::foundation::{CustomerId, DomainError};
use crate::ports::DependentRepository;

const STORE: &str = "dependents";

/// Dependent store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDependentRepository {
    rows: RwLock<Vec<Dependent>>,
    faults: FaultSwitch,
}

impl InMemoryDependentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations: `create`, `delete`, `find`.
    pub fn faults(&self) -> &FaultSwitch {
        &self.faults
    }

    pub fn count(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }
}

#[async_trait]
impl DependentRepository for InMemoryDependentRepository {
    async fn create_many(&self, dependents: &[Dependent]) -> Result<(), DomainError> {
        self.faults.check(STORE, "create")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.extend_from_slice(dependents);
        Ok(())
    }

    async fn delete_by_customer(&self, customer_id: &CustomerId) -> Result<(), DomainError> {
        self.faults.check(STORE, "delete")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.retain(|d| &d.customer_id != customer_id);
        Ok(())
    }

    async fn find_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Dependent>, DomainError> {
        self.faults.check(STORE, "find")?;
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows
            .iter()
            .filter(|d| &d.customer_id == customer_id)
            .cloned()
            .collect())
    }
}
