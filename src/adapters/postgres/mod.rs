//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCustomerRepository` - customers, looked up by id, gateway id or duplicity
//! - `PostgresSubscriptionRepository` - subscriptions and the PIX expiration update
//! - `PostgresPlanRepository` - read-only plan catalog
//! - `PostgresDependentRepository` - dependents, inserted in one transaction
//! - `PostgresLeadRepository` - leads, upserted by email
//! - `PostgresReadiness` - `SELECT 1` probe for `/ready`

mod customer_repository;
mod dependent_repository;
mod lead_repository;
mod plan_repository;
mod readiness;
mod subscription_repository;

pub use customer_repository::PostgresCustomerRepository;
pub use dependent_repository::PostgresDependentRepository;
pub use lead_repository::PostgresLeadRepository;
pub use plan_repository::PostgresPlanRepository;
pub use readiness::PostgresReadiness;
pub use subscription_repository::PostgresSubscriptionRepository;

/// Embedded SQL migrations under `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
