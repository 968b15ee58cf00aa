//! GetCustomerStatusHandler - Query handler for the signup status poll.

use std::sync::Arc;

use crate::domain::checkout::CustomerStatus;
use crate::domain::foundation::CustomerId;
use crate::ports::CustomerRepository;

/// Query for a customer's status.
#[derive(Debug, Clone)]
pub struct GetCustomerStatusQuery {
    pub customer_id: CustomerId,
}

/// Handler for the status poll used by the payment page.
///
/// Unknown customers and store failures both report `PENDING`, so the
/// page keeps polling instead of showing an error.
pub struct GetCustomerStatusHandler {
    customers: Arc<dyn CustomerRepository>,
}

impl GetCustomerStatusHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn handle(&self, query: GetCustomerStatusQuery) -> CustomerStatus {
        match self.customers.find_by_id(&query.customer_id).await {
            Ok(Some(customer)) => customer.status,
            Ok(None) => CustomerStatus::Pending,
            Err(e) => {
                tracing::warn!(
                    customer_id = %query.customer_id,
                    error = %e,
                    "status lookup failed, reporting pending"
                );
                CustomerStatus::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCustomerRepository;
    use crate::domain::checkout::{Address, Customer};
    use crate::domain::foundation::{PlanId, Timestamp};
    use chrono::NaiveDate;

    fn customer(status: CustomerStatus) -> Customer {
        let now = Timestamp::now();
        Customer {
            id: CustomerId::new(),
            name: "Ana Lima".to_string(),
            email: "ana@example.com".to_string(),
            cpf: "52998224725".to_string(),
            phone: "11987654321".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            gender: "F".to_string(),
            address: Address::default(),
            plan_id: PlanId::new(),
            external_customer_id: "cus_1".to_string(),
            provider_id: None,
            status,
            terms_accepted: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn returns_stored_status() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let active = customer(CustomerStatus::Active);
        let id = active.id;
        repo.insert(active);

        let handler = GetCustomerStatusHandler::new(repo);
        let status = handler.handle(GetCustomerStatusQuery { customer_id: id }).await;

        assert_eq!(status, CustomerStatus::Active);
    }

    #[tokio::test]
    async fn unknown_customer_is_pending() {
        let handler = GetCustomerStatusHandler::new(Arc::new(InMemoryCustomerRepository::new()));
        let status = handler
            .handle(GetCustomerStatusQuery {
                customer_id: CustomerId::new(),
            })
            .await;

        assert_eq!(status, CustomerStatus::Pending);
    }

    #[tokio::test]
    async fn store_failure_is_pending() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let expired = customer(CustomerStatus::Expired);
        let id = expired.id;
        repo.insert(expired);
        repo.faults().fail("find");

        let handler = GetCustomerStatusHandler::new(repo);
        let status = handler.handle(GetCustomerStatusQuery { customer_id: id }).await;

        assert_eq!(status, CustomerStatus::Pending);
    }
}
