//! Subscription repository port.

use crate::domain::checkout::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{CustomerId, DomainError, SubscriptionId, Timestamp};
use async_trait::async_trait;

/// Repository port for subscriptions.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new subscription.
    async fn create(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Deletes a subscription. Deleting a missing row is not an error.
    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError>;

    /// Most recently created subscription of a customer.
    async fn find_latest_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Sets the lifecycle status. Setting the current status again succeeds.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if no row matches
    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError>;

    /// Moves PIX subscriptions still `PENDING` and created before `cutoff`
    /// to `EXPIRED`, returning the rows that changed.
    async fn expire_pending_pix(&self, cutoff: Timestamp) -> Result<Vec<Subscription>, DomainError>;
}
