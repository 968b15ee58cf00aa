use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{lock_poisoned, FaultSwitch};
use crate::domain::checkout::Plan;
use crate::domain::foundation::{DomainError, PlanId};
use crate::ports::PlanRepository;

const STORE: &str = "plans";

/// Plan catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlanRepository {
    rows: RwLock<HashMap<PlanId, Plan>>,
    faults: FaultSwitch,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let repo = Self::new();
        for plan in plans {
            repo.insert(plan);
        }
        repo
    }

    /// Operations: `find`.
    pub fn faults(&self) -> &FaultSwitch {
        &self.faults
    }

    pub fn insert(&self, plan: Plan) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(plan.id, plan);
        }
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        self.faults.check(STORE, "find")?;
        let rows = self.rows.read().map_err(|_| lock_poisoned(STORE))?;
        Ok(rows.get(id).cloned())
    }
}
