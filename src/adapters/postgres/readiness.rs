//! Database readiness probe.

use crate::domain::foundation::DomainError;
use crate::ports::ReadinessCheck;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresReadiness {
    pool: PgPool,
}

impl PostgresReadiness {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessCheck for PostgresReadiness {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }
}
