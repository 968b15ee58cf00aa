//! In-memory repository adapters.
//!
//! Used by tests and by local runs without a database. Every store carries a
//! [`FaultSwitch`] so a test can make a named operation fail and observe how
//! the caller reacts.

mod customer_repository;
mod dependent_repository;
mod lead_repository;
mod plan_repository;
mod subscription_repository;

pub use customer_repository::InMemoryCustomerRepository;
pub use dependent_repository::InMemoryDependentRepository;
pub use lead_repository::InMemoryLeadRepository;
pub use plan_repository::InMemoryPlanRepository;
pub use subscription_repository::InMemorySubscriptionRepository;

use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Set of operation names that should fail.
#[derive(Debug, Default)]
pub struct FaultSwitch {
    failing: RwLock<HashSet<&'static str>>,
}

impl FaultSwitch {
    /// Makes `operation` fail until healed.
    pub fn fail(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(operation);
        }
    }

    /// Makes `operation` succeed again.
    pub fn heal(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.remove(operation);
        }
    }

    fn check(&self, store: &str, operation: &'static str) -> Result<(), DomainError> {
        let failing = self.failing.read().map_err(|_| lock_poisoned(store))?;
        if failing.contains(operation) {
            return Err(DomainError::database(format!(
                "simulated {} failure in {}",
                operation, store
            )));
        }
        Ok(())
    }
}

fn lock_poisoned(store: &str) -> DomainError {
    DomainError::new(ErrorCode::InternalError, format!("{}: lock poisoned", store))
}
