//! PostgreSQL implementation of LeadRepository.

use crate::domain::checkout::Lead;
use crate::domain::foundation::DomainError;
use crate::ports::LeadRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn upsert(&self, lead: &Lead) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO leads (id, email, name, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (email) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, leads.name),
                phone = COALESCE(EXCLUDED.phone, leads.phone),
                updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&lead.email)
        .bind(&lead.name)
        .bind(&lead.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert lead: {}", e)))?;

        Ok(())
    }
}
