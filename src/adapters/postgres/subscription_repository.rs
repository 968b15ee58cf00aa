//! PostgreSQL implementation of SubscriptionRepository.

use crate::domain::checkout::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, PlanId, SubscriptionId, Timestamp,
};
use crate::ports::SubscriptionRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, customer_id, plan_id, amount_cents, status, payment_method,
    billing_cycle, next_due_date, external_subscription_id, created_at, updated_at
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    customer_id: Uuid,
    plan_id: Option<Uuid>,
    amount_cents: i64,
    status: String,
    payment_method: String,
    billing_cycle: String,
    next_due_date: NaiveDate,
    external_subscription_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let invalid = |column: &str, value: &str| {
            DomainError::database(format!("Invalid subscription {} '{}'", column, value))
        };

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            plan_id: row.plan_id.map(PlanId::from_uuid),
            amount_cents: row.amount_cents,
            status: row
                .status
                .parse()
                .map_err(|_| invalid("status", &row.status))?,
            payment_method: row
                .payment_method
                .parse()
                .map_err(|_| invalid("payment_method", &row.payment_method))?,
            billing_cycle: row
                .billing_cycle
                .parse()
                .map_err(|_| invalid("billing_cycle", &row.billing_cycle))?,
            next_due_date: row.next_due_date,
            external_subscription_id: row.external_subscription_id,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, customer_id, plan_id, amount_cents, status, payment_method,
                billing_cycle, next_due_date, external_subscription_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.customer_id.as_uuid())
        .bind(subscription.plan_id.map(|id| *id.as_uuid()))
        .bind(subscription.amount_cents)
        .bind(subscription.status.as_str())
        .bind(subscription.payment_method.as_str())
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.next_due_date)
        .bind(&subscription.external_subscription_id)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert subscription: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete subscription: {}", e)))?;

        Ok(())
    }

    async fn find_latest_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(customer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch subscription: {}", e)))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: &SubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to update subscription status: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} not found", id),
            ));
        }
        Ok(())
    }

    async fn expire_pending_pix(&self, cutoff: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE subscriptions SET status = 'EXPIRED', updated_at = $2
            WHERE status = 'PENDING' AND payment_method = 'PIX' AND created_at < $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(cutoff.as_datetime())
        .bind(Timestamp::now().as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to expire PIX subscriptions: {}", e)))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
