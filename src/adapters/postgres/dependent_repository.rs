//! PostgreSQL implementation of DependentRepository.

use crate::domain::checkout::{Dependent, DependentGender};
use crate::domain::foundation::{CustomerId, DependentId, DomainError, Timestamp};
use crate::ports::DependentRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresDependentRepository {
    pool: PgPool,
}

impl PostgresDependentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DependentRow {
    id: Uuid,
    customer_id: Uuid,
    name: String,
    cpf: String,
    birth_date: NaiveDate,
    gender: i16,
    kinship: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DependentRow> for Dependent {
    type Error = DomainError;

    fn try_from(row: DependentRow) -> Result<Self, Self::Error> {
        Ok(Dependent {
            id: DependentId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            name: row.name,
            cpf: row.cpf,
            birth_date: row.birth_date,
            gender: DependentGender::new(row.gender)
                .map_err(|e| DomainError::database(format!("Invalid dependent gender: {}", e)))?,
            kinship: row.kinship,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl DependentRepository for PostgresDependentRepository {
    /// Inserts all dependents in one transaction.
    async fn create_many(&self, dependents: &[Dependent]) -> Result<(), DomainError> {
        if dependents.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            DomainError::database(format!("Failed to start transaction: {}", e))
        })?;

        for dependent in dependents {
            sqlx::query(
                r#"
                INSERT INTO dependents (
                    id, customer_id, name, cpf, birth_date, gender, kinship, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(dependent.id.as_uuid())
            .bind(dependent.customer_id.as_uuid())
            .bind(&dependent.name)
            .bind(&dependent.cpf)
            .bind(dependent.birth_date)
            .bind(dependent.gender.code())
            .bind(&dependent.kinship)
            .bind(dependent.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to insert dependent: {}", e)))?;
        }

        tx.commit().await.map_err(|e| {
            DomainError::database(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(())
    }

    async fn delete_by_customer(&self, customer_id: &CustomerId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM dependents WHERE customer_id = $1")
            .bind(customer_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete dependents: {}", e)))?;

        Ok(())
    }

    async fn find_by_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<Dependent>, DomainError> {
        let rows: Vec<DependentRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, name, cpf, birth_date, gender, kinship, created_at
            FROM dependents
            WHERE customer_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch dependents: {}", e)))?;

        rows.into_iter().map(Dependent::try_from).collect()
    }
}
