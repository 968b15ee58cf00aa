//! ExpirePixSubscriptionsHandler - Expires PIX signups that were never paid.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::checkout::CustomerStatus;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{CustomerRepository, SubscriptionRepository};

/// Default age after which an unpaid PIX subscription expires.
pub const DEFAULT_PIX_TTL: Duration = Duration::from_secs(30 * 60);

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirePixSubscriptionsResult {
    pub subscriptions_expired: usize,
    pub customers_expired: usize,
}

/// Marks PENDING PIX subscriptions older than the TTL as EXPIRED and moves
/// their customers to EXPIRED.
pub struct ExpirePixSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    customers: Arc<dyn CustomerRepository>,
    ttl: Duration,
}

impl ExpirePixSubscriptionsHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        customers: Arc<dyn CustomerRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            subscriptions,
            customers,
            ttl,
        }
    }

    pub async fn handle(&self) -> Result<ExpirePixSubscriptionsResult, DomainError> {
        self.handle_at(Timestamp::now()).await
    }

    pub async fn handle_at(
        &self,
        now: Timestamp,
    ) -> Result<ExpirePixSubscriptionsResult, DomainError> {
        let minutes = i64::try_from(self.ttl.as_secs() / 60).unwrap_or(i64::MAX);
        let cutoff = now.minus_minutes(minutes);

        let expired = self.subscriptions.expire_pending_pix(cutoff).await?;

        let mut result = ExpirePixSubscriptionsResult {
            subscriptions_expired: expired.len(),
            customers_expired: 0,
        };

        for subscription in &expired {
            match self
                .customers
                .update_status(&subscription.customer_id, CustomerStatus::Expired)
                .await
            {
                Ok(()) => result.customers_expired += 1,
                Err(e) => tracing::warn!(
                    customer_id = %subscription.customer_id,
                    subscription_id = %subscription.id,
                    error = %e,
                    "failed to expire customer"
                ),
            }
        }

        if result.subscriptions_expired > 0 {
            tracing::info!(
                subscriptions = result.subscriptions_expired,
                customers = result.customers_expired,
                "expired unpaid pix subscriptions"
            );
        }

        Ok(result)
    }
}
