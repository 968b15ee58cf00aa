//! ValidateUserHandler - Duplicate check run before the checkout form is sent.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::ports::CustomerRepository;

/// Email and CPF the storefront wants to sign up with.
#[derive(Debug, Clone)]
pub struct ValidateUserCommand {
    pub email: String,
    pub cpf: String,
}

/// Whether a new signup may use the submitted identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAvailability {
    Available,
    /// A customer already holds the email or the CPF.
    Taken,
}

/// Answers whether the email or CPF already belongs to a customer.
pub struct ValidateUserHandler {
    customers: Arc<dyn CustomerRepository>,
}

impl ValidateUserHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn handle(&self, cmd: ValidateUserCommand) -> Result<UserAvailability, CheckoutError> {
        if cmd.email.trim().is_empty() {
            return Err(CheckoutError::validation("email", "email and cpf are required"));
        }
        if cmd.cpf.trim().is_empty() {
            return Err(CheckoutError::validation("cpf", "email and cpf are required"));
        }

        let taken = self
            .customers
            .exists_by_email_or_cpf(&cmd.email, &cmd.cpf)
            .await?;

        Ok(if taken {
            UserAvailability::Taken
        } else {
            UserAvailability::Available
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCustomerRepository;
    use crate::domain::checkout::{Address, Customer, CustomerStatus};
    use crate::domain::foundation::{CustomerId, PlanId, Timestamp};
    use chrono::NaiveDate;

    fn existing_customer() -> Customer {
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
            status: CustomerStatus::Active,
            terms_accepted: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn handler_with_customer() -> (ValidateUserHandler, Arc<InMemoryCustomerRepository>) {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        repo.insert(existing_customer());
        (ValidateUserHandler::new(repo.clone()), repo)
    }

    fn command(email: &str, cpf: &str) -> ValidateUserCommand {
        ValidateUserCommand {
            email: email.to_string(),
            cpf: cpf.to_string(),
        }
    }

    #[tokio::test]
    async fn email_in_use_is_taken_regardless_of_case() {
        let (handler, _) = handler_with_customer();
        let result = handler
            .handle(command(" Ana@Example.COM ", "111.444.777-35"))
            .await
            .unwrap();
        assert_eq!(result, UserAvailability::Taken);
    }

    #[tokio::test]
    async fn formatted_cpf_in_use_is_taken() {
        let (handler, _) = handler_with_customer();
        let result = handler
            .handle(command("other@example.com", "529.982.247-25"))
            .await
            .unwrap();
        assert_eq!(result, UserAvailability::Taken);
    }

    #[tokio::test]
    async fn unused_identity_is_available() {
        let (handler, _) = handler_with_customer();
        let result = handler
            .handle(command("other@example.com", "111.444.777-35"))
            .await
            .unwrap();
        assert_eq!(result, UserAvailability::Available);
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let (handler, _) = handler_with_customer();

        let err = handler.handle(command("", "52998224725")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ValidationFailed { ref field, .. } if field == "email"));

        let err = handler.handle(command("ana@example.com", "  ")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ValidationFailed { ref field, .. } if field == "cpf"));
    }

    #[tokio::test]
    async fn store_failure_is_technical() {
        let (handler, repo) = handler_with_customer();
        repo.faults().fail("exists");

        let err = handler
            .handle(command("other@example.com", "111.444.777-35"))
            .await
            .unwrap_err();
        assert!(err.is_technical());
    }
}
