//! Plan catalog lookup port (read-only).

use crate::domain::checkout::Plan;
use crate::domain::foundation::{DomainError, PlanId};
use async_trait::async_trait;

/// Read-only access to the plan catalog.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Finds a plan by id. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;
}
