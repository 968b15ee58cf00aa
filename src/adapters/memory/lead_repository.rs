use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{lock_poisoned, FaultSwitch};
use crate::domain::checkout::Lead;
use crate::domain::foundation::DomainError;
use crate::ports::LeadRepository;

const STORE: &str = "leads";

/// Lead store keyed by email.
#[derive(Debug, Default)]
pub struct InMemoryLeadRepository {
    rows: RwLock<HashMap<String, Lead>>,
    faults: FaultSwitch,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations: `upsert`.
    pub fn faults(&self) -> &FaultSwitch {
        &self.faults
    }

    pub fn find(&self, email: &str) -> Option<Lead> {
        self.rows.read().ok().and_then(|rows| rows.get(email).cloned())
    }

    pub fn count(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn upsert(&self, lead: &Lead) -> Result<(), DomainError> {
        self.faults.check(STORE, "upsert")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.entry(lead.email.clone())
            .and_modify(|stored| {
                if lead.name.is_some() {
                    stored.name = lead.name.clone();
                }
                if lead.phone.is_some() {
                    stored.phone = lead.phone.clone();
                }
            })
            .or_insert_with(|| lead.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_keeps_stored_fields_when_new_ones_are_missing() {
        let repo = InMemoryLeadRepository::new();
        repo.upsert(&Lead::new("ana@example.com", Some("Ana"), Some("11987654321")).unwrap())
            .await
            .unwrap();
        repo.upsert(&Lead::new("ANA@example.com", None, Some("11911112222")).unwrap())
            .await
            .unwrap();

        let lead = repo.find("ana@example.com").unwrap();
        assert_eq!(repo.count(), 1);
        assert_eq!(lead.name.as_deref(), Some("Ana"));
        assert_eq!(lead.phone.as_deref(), Some("11911112222"));
    }
}
