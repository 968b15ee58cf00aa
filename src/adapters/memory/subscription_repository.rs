use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{lock_poisoned, FaultSwitch};
use crate::domain::checkout::{PaymentMethod, Subscription, SubscriptionStatus};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::ports::SubscriptionRepository;

const STORE: &str = "subscriptions";

/// Subscription store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
    rows: RwLock<HashMap<SubscriptionId, Subscription>>,
    faults: FaultSwitch,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations: `create`, `delete`, `find`, `update_status`, `expire`.
    pub fn faults(&self) -> &FaultSwitch {
        &self.faults
    }

    pub fn insert(&self, subscription: Subscription) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(subscription.id, subscription);
        }
    }

    pub fn all(&self) -> Vec<Subscription> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.faults.check(STORE, "create")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        self.faults.check(STORE, "delete")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        rows.remove(id);
        Ok(())
    }

    async fn find_latest_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Subscription>, DomainError> {
        self.faults.check(STORE, "find")?;
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows
            .values()
            .filter(|s| &s.customer_id == customer_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        self.faults.check(STORE, "update_status")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        let row = rows.get_mut(id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} not found", id),
            )
        })?;
        row.status = status;
        row.updated_at = Timestamp::now();
        Ok(())
    }

    async fn expire_pending_pix(&self, cutoff: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        self.faults.check(STORE, "expire")?;
        let mut rows = self.rows.write().map_err(|_| lock_poisoned(STORE))?;
        let now = Timestamp::now();
        let mut expired = Vec::new();
        for row in rows.values_mut() {
            if row.payment_method == PaymentMethod::Pix
                && row.status == SubscriptionStatus::Pending
                && row.created_at.is_before(&cutoff)
            {
                row.status = SubscriptionStatus::Expired;
                row.updated_at = now;
                expired.push(row.clone());
            }
        }
        Ok(expired)
    }
}
