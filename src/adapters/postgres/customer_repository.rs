//! PostgreSQL implementation of CustomerRepository.

use crate::domain::checkout::{digits_only, Address, Customer, CustomerStatus};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, PlanId, Timestamp};
use crate::ports::CustomerRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const CUSTOMER_COLUMNS: &str = r#"
    id, name, email, cpf, phone, birth_date, gender,
    zip_code, street, number, complement, neighborhood, city, state,
    plan_id, external_customer_id, provider_id, status, terms_accepted,
    created_at, updated_at
"#;

pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    email: String,
    cpf: String,
    phone: String,
    birth_date: NaiveDate,
    gender: String,
    zip_code: String,
    street: String,
    number: String,
    complement: Option<String>,
    neighborhood: String,
    city: String,
    state: String,
    plan_id: Uuid,
    external_customer_id: String,
    provider_id: Option<String>,
    status: String,
    terms_accepted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let status: CustomerStatus = row.status.parse().map_err(|e| {
            DomainError::database(format!("Invalid customer status '{}': {}", row.status, e))
        })?;

        Ok(Customer {
            id: CustomerId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            cpf: row.cpf,
            phone: row.phone,
            birth_date: row.birth_date,
            gender: row.gender,
            address: Address {
                zip_code: row.zip_code,
                street: row.street,
                number: row.number,
                complement: row.complement,
                neighborhood: row.neighborhood,
                city: row.city,
                state: row.state,
            },
            plan_id: PlanId::from_uuid(row.plan_id),
            external_customer_id: row.external_customer_id,
            provider_id: row.provider_id,
            status,
            terms_accepted: row.terms_accepted,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn not_found(id: &CustomerId) -> DomainError {
    DomainError::new(ErrorCode::CustomerNotFound, format!("customer {} not found", id))
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn create(&self, customer: &Customer) -> Result<(), DomainError> {
        let address = &customer.address;
        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, cpf, phone, birth_date, gender,
                zip_code, street, number, complement, neighborhood, city, state,
                plan_id, external_customer_id, provider_id, status, terms_accepted,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.cpf)
        .bind(&customer.phone)
        .bind(customer.birth_date)
        .bind(&customer.gender)
        .bind(&address.zip_code)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(customer.plan_id.as_uuid())
        .bind(&customer.external_customer_id)
        .bind(&customer.provider_id)
        .bind(customer.status.as_str())
        .bind(customer.terms_accepted)
        .bind(customer.created_at.as_datetime())
        .bind(customer.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert customer: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, id: &CustomerId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete customer: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch customer: {}", e)))?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE external_customer_id = $1 ORDER BY created_at DESC LIMIT 1",
            CUSTOMER_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch customer: {}", e)))?;

        row.map(Customer::try_from).transpose()
    }

    async fn exists_by_email_or_cpf(&self, email: &str, cpf: &str) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE lower(email) = lower($1) OR cpf = $2)",
        )
        .bind(email.trim())
        .bind(digits_only(cpf))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check customer duplicity: {}", e)))?;

        Ok(exists)
    }

    async fn update_status(
        &self,
        id: &CustomerId,
        status: CustomerStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE customers SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update customer status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn update_provider_id(
        &self,
        id: &CustomerId,
        provider_id: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE customers SET provider_id = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(provider_id)
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update provider id: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
