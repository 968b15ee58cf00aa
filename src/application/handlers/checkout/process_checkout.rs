//! ProcessCheckoutHandler - Charges the customer and persists the signup.
//!
//! Sequence:
//! 1. Validate the form and load the plan (domain errors, nothing written)
//! 2. Register the payer and create the recurring charge at the gateway
//!    (any gateway error is a domain `PaymentFailed`, nothing written)
//! 3. Run the persistence saga: customer, subscription, dependents. Each
//!    step has its compensation registered before it runs. The already
//!    issued charge joins the unwind stack as a cancellation.
//!
//! Provider enrollment never happens here; it waits for the payment
//! webhook and the activation worker.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::checkout::{
    action, digits_only, parse_date, BillingCycle, CheckoutError, CheckoutForm, Customer,
    CustomerStatus, Dependent, DependentGender, PaymentMethod, Plan, Subscription,
    SubscriptionStatus, Transaction,
};
use crate::domain::foundation::{
    CustomerId, DependentId, DomainError, PlanId, SubscriptionId, Timestamp,
};
use crate::ports::{
    CardSubscriptionRequest, CheckoutValidator, CustomerRepository, DependentRepository,
    GatewayCustomer, PaymentGateway, PixArtifact, PixSubscriptionRequest, PlanRepository,
    SubscriptionRepository,
};

/// Caller-facing confirmation message.
pub const CHECKOUT_SUCCESS_MESSAGE: &str = "Pré-cadastro realizado com sucesso!";

/// Status reported to the caller while a PIX charge awaits payment.
pub const PIX_WAITING_STATUS: &str = "WAITING_PAYMENT";

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    pub customer_id: CustomerId,
    pub subscription_id: SubscriptionId,
    /// Gateway status for card payments, `WAITING_PAYMENT` for PIX.
    pub status: String,
    /// Present for PIX payments only.
    pub pix: Option<PixArtifact>,
    pub message: String,
}

/// Gateway outcome carried into the persistence saga.
struct Charge {
    external_customer_id: String,
    external_subscription_id: String,
    status: String,
    pix: Option<PixArtifact>,
}

/// Handler for checkout submissions.
pub struct ProcessCheckoutHandler {
    validator: Arc<dyn CheckoutValidator>,
    plans: Arc<dyn PlanRepository>,
    gateway: Arc<dyn PaymentGateway>,
    customers: Arc<dyn CustomerRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    dependents: Arc<dyn DependentRepository>,
}

impl ProcessCheckoutHandler {
    pub fn new(
        validator: Arc<dyn CheckoutValidator>,
        plans: Arc<dyn PlanRepository>,
        gateway: Arc<dyn PaymentGateway>,
        customers: Arc<dyn CustomerRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        dependents: Arc<dyn DependentRepository>,
    ) -> Self {
        Self {
            validator,
            plans,
            gateway,
            customers,
            subscriptions,
            dependents,
        }
    }

    pub async fn handle(&self, form: CheckoutForm) -> Result<CheckoutResult, CheckoutError> {
        // 1. Validate input
        self.validator.validate(&form)?;
        let method: PaymentMethod = form.payment_method.parse()?;
        let plan_id: PlanId = form
            .plan_id
            .trim()
            .parse()
            .map_err(|_| CheckoutError::validation("plan_id", "must be a UUID"))?;
        let birth_date = parse_date("birth_date", &form.birth_date)?;
        if method == PaymentMethod::CreditCard && form.card.is_none() {
            return Err(CheckoutError::validation("card", "card data required"));
        }

        // 2. Load plan
        let plan = self
            .plans
            .find_by_id(&plan_id)
            .await
            .map_err(|e| CheckoutError::infrastructure(e.to_string()))?
            .filter(|p| p.active)
            .ok_or_else(|| CheckoutError::plan_not_found(plan_id.to_string()))?;

        // 3. Charge at the gateway (fails closed, nothing persisted yet)
        let charge = self.charge(&form, method, &plan).await?;

        // 4. Build entities
        let now = Timestamp::now();
        let customer = build_customer(&form, birth_date, &plan, &charge, now);
        let subscription = Subscription {
            id: SubscriptionId::new(),
            customer_id: customer.id,
            plan_id: Some(plan.id),
            amount_cents: plan.price_cents,
            status: SubscriptionStatus::Pending,
            payment_method: method,
            billing_cycle: BillingCycle::Monthly,
            next_due_date: now.date(),
            external_subscription_id: charge.external_subscription_id.clone(),
            created_at: now,
            updated_at: now,
        };
        let dependents = build_dependents(&form, customer.id, now)?;

        // 5. Persist with compensation
        self.persist(&customer, &subscription, dependents, &charge)
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            subscription_id = %subscription.id,
            plan_id = %plan.id,
            payment_method = %method,
            amount_cents = plan.price_cents,
            "checkout completed"
        );

        Ok(CheckoutResult {
            customer_id: customer.id,
            subscription_id: subscription.id,
            status: charge.status,
            pix: charge.pix,
            message: CHECKOUT_SUCCESS_MESSAGE.to_string(),
        })
    }

    async fn charge(
        &self,
        form: &CheckoutForm,
        method: PaymentMethod,
        plan: &Plan,
    ) -> Result<Charge, CheckoutError> {
        let profile = GatewayCustomer {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            cpf_cnpj: digits_only(&form.cpf),
            phone: digits_only(&form.phone),
            postal_code: digits_only(&form.address.zip_code),
            address_number: form.address.number.trim().to_string(),
        };

        let external_customer_id = self
            .gateway
            .create_customer(&profile)
            .await
            .map_err(|e| payment_failed("create_customer", e))?;

        match method {
            PaymentMethod::CreditCard => {
                let card = form
                    .card
                    .clone()
                    .ok_or_else(|| CheckoutError::validation("card", "card data required"))?;
                let subscription = self
                    .gateway
                    .subscribe(&CardSubscriptionRequest {
                        external_customer_id: external_customer_id.clone(),
                        amount_cents: plan.price_cents,
                        card,
                        holder: profile,
                    })
                    .await
                    .map_err(|e| payment_failed("subscribe", e))?;
                Ok(Charge {
                    external_customer_id,
                    external_subscription_id: subscription.id,
                    status: subscription.status,
                    pix: None,
                })
            }
            PaymentMethod::Pix => {
                let subscription = self
                    .gateway
                    .subscribe_pix(&PixSubscriptionRequest {
                        external_customer_id: external_customer_id.clone(),
                        amount_cents: plan.price_cents,
                    })
                    .await
                    .map_err(|e| payment_failed("subscribe_pix", e))?;
                Ok(Charge {
                    external_customer_id,
                    external_subscription_id: subscription.id,
                    status: PIX_WAITING_STATUS.to_string(),
                    pix: Some(subscription.pix),
                })
            }
        }
    }

    async fn persist(
        &self,
        customer: &Customer,
        subscription: &Subscription,
        dependents: Vec<Dependent>,
        charge: &Charge,
    ) -> Result<(), CheckoutError> {
        let gateway = self.gateway.clone();
        let external_subscription_id = charge.external_subscription_id.clone();

        let customers = self.customers.clone();
        let new_customer = customer.clone();
        let customers_undo = self.customers.clone();
        let customer_id = customer.id;

        let subscriptions = self.subscriptions.clone();
        let new_subscription = subscription.clone();
        let subscriptions_undo = self.subscriptions.clone();
        let subscription_id = subscription.id;

        let mut transaction = Transaction::<DomainError>::new("checkout")
            .completed(
                "gateway_charge",
                action(move || async move {
                    gateway
                        .cancel_subscription(&external_subscription_id)
                        .await
                        .map_err(DomainError::from)
                }),
            )
            .step(
                "persist_customer",
                action(move || async move { customers.create(&new_customer).await }),
                action(move || async move { customers_undo.delete(&customer_id).await }),
            )
            .step(
                "persist_subscription",
                action(move || async move { subscriptions.create(&new_subscription).await }),
                action(move || async move { subscriptions_undo.delete(&subscription_id).await }),
            );

        if !dependents.is_empty() {
            let repo = self.dependents.clone();
            let repo_undo = self.dependents.clone();
            transaction = transaction.step(
                "persist_dependents",
                action(move || async move { repo.create_many(&dependents).await }),
                action(move || async move { repo_undo.delete_by_customer(&customer_id).await }),
            );
        }

        transaction.execute().await.map_err(|failure| {
            if !failure.fully_compensated() {
                tracing::warn!(
                    customer_id = %customer_id,
                    failed_step = failure.failed_step,
                    uncompensated = ?failure.compensation_failures,
                    "checkout left partial state behind"
                );
            }
            CheckoutError::persistence(failure.failed_step, failure.error.to_string())
        })
    }
}

fn payment_failed(operation: &str, err: crate::ports::PaymentError) -> CheckoutError {
    tracing::warn!(operation, code = %err.code, error = %err.message, "gateway call failed");
    CheckoutError::payment_failed(err.message)
}

fn build_customer(
    form: &CheckoutForm,
    birth_date: NaiveDate,
    plan: &Plan,
    charge: &Charge,
    now: Timestamp,
) -> Customer {
    let mut address = form.address.clone();
    address.zip_code = digits_only(&address.zip_code);
    Customer {
        id: CustomerId::new(),
        name: form.name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        cpf: digits_only(&form.cpf),
        phone: digits_only(&form.phone),
        birth_date,
        gender: form.gender.trim().to_string(),
        address,
        plan_id: plan.id,
        external_customer_id: charge.external_customer_id.clone(),
        provider_id: None,
        status: CustomerStatus::Pending,
        terms_accepted: form.terms_accepted,
        created_at: now,
        updated_at: now,
    }
}

fn build_dependents(
    form: &CheckoutForm,
    customer_id: CustomerId,
    now: Timestamp,
) -> Result<Vec<Dependent>, CheckoutError> {
    form.dependents
        .iter()
        .map(|d| {
            Ok(Dependent {
                id: DependentId::new(),
                customer_id,
                name: d.name.trim().to_string(),
                cpf: digits_only(&d.cpf),
                birth_date: parse_date("dependents.birth_date", &d.birth_date)?,
                gender: DependentGender::new(d.gender)?,
                kinship: d.kinship.trim().to_uppercase(),
                created_at: now,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::MockPaymentGateway;
    use crate::adapters::memory::{
        InMemoryCustomerRepository, InMemoryDependentRepository, InMemoryPlanRepository,
        InMemorySubscriptionRepository,
    };
    use crate::domain::checkout::{Address, CardForm, DependentForm, ProviderCode};
    use crate::domain::foundation::ValidationError;
    use crate::ports::{AcceptAllValidator, PaymentError};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        gateway: MockPaymentGateway,
        plans: Arc<InMemoryPlanRepository>,
        customers: Arc<InMemoryCustomerRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        dependents: Arc<InMemoryDependentRepository>,
        plan: Plan,
    }

    impl Fixture {
        fn new() -> Self {
            let plan = Plan {
                id: PlanId::new(),
                name: "Individual".to_string(),
                price_cents: 29900,
                provider: ProviderCode::doc24(),
                provider_plan_code: "IND-01".to_string(),
                active: true,
            };
            Self {
                gateway: MockPaymentGateway::new(),
                plans: Arc::new(InMemoryPlanRepository::with_plans([plan.clone()])),
                customers: Arc::new(InMemoryCustomerRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                dependents: Arc::new(InMemoryDependentRepository::new()),
                plan,
            }
        }

        fn handler(&self) -> ProcessCheckoutHandler {
            self.handler_with(Arc::new(AcceptAllValidator))
        }

        fn handler_with(&self, validator: Arc<dyn CheckoutValidator>) -> ProcessCheckoutHandler {
            ProcessCheckoutHandler::new(
                validator,
                self.plans.clone(),
                Arc::new(self.gateway.clone()),
                self.customers.clone(),
                self.subscriptions.clone(),
                self.dependents.clone(),
            )
        }

        fn form(&self, method: &str) -> CheckoutForm {
            CheckoutForm {
                name: "Ana Paula Lima".to_string(),
                email: "Ana@Example.com".to_string(),
                cpf: "529.982.247-25".to_string(),
                phone: "11987654321".to_string(),
                birth_date: "1990-04-12".to_string(),
                gender: "F".to_string(),
                address: Address {
                    zip_code: "01310-100".to_string(),
                    number: "1000".to_string(),
                    ..Default::default()
                },
                plan_id: self.plan.id.to_string(),
                payment_method: method.to_string(),
                card: (method == "CREDIT_CARD").then(|| CardForm {
                    holder_name: "ANA LIMA".to_string(),
                    number: "4111111111111111".to_string(),
                    expiry_month: "12".to_string(),
                    expiry_year: "2030".to_string(),
                    ccv: "123".to_string(),
                }),
                dependents: Vec::new(),
                terms_accepted: true,
            }
        }
    }

    struct RejectingValidator;

    impl CheckoutValidator for RejectingValidator {
        fn validate(&self, _form: &CheckoutForm) -> Result<(), ValidationError> {
            Err(ValidationError::invalid_format("email", "not a valid address"))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn pix_checkout_returns_artifact_and_persists_pending_rows() {
        let fx = Fixture::new();
        let result = fx.handler().handle(fx.form("PIX")).await.unwrap();

        assert_eq!(result.status, PIX_WAITING_STATUS);
        assert_eq!(result.message, CHECKOUT_SUCCESS_MESSAGE);
        let pix = result.pix.expect("pix artifact");
        assert!(!pix.copy_paste.is_empty());
        assert!(!pix.qr_code_url.is_empty());

        let customers = fx.customers.all();
        let subscriptions = fx.subscriptions.all();
        assert_eq!(customers.len(), 1);
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(customers[0].status, CustomerStatus::Pending);
        assert_eq!(subscriptions[0].status, SubscriptionStatus::Pending);
        assert_eq!(subscriptions[0].amount_cents, 29900);
        assert_eq!(subscriptions[0].customer_id, customers[0].id);
        assert_eq!(subscriptions[0].plan_id, Some(fx.plan.id));
    }

    #[tokio::test]
    async fn card_checkout_passes_gateway_status_and_has_no_artifact() {
        let fx = Fixture::new();
        fx.gateway.set_card_status("CONFIRMED");
        let result = fx.handler().handle(fx.form("CREDIT_CARD")).await.unwrap();

        assert_eq!(result.status, "CONFIRMED");
        assert!(result.pix.is_none());
        assert_eq!(fx.gateway.calls_to("subscribe"), 1);
        assert_eq!(fx.gateway.calls_to("subscribe_pix"), 0);
    }

    #[tokio::test]
    async fn customer_fields_are_normalized() {
        let fx = Fixture::new();
        fx.handler().handle(fx.form("PIX")).await.unwrap();

        let customer = &fx.customers.all()[0];
        assert_eq!(customer.cpf, "52998224725");
        assert_eq!(customer.email, "ana@example.com");
        assert_eq!(customer.address.zip_code, "01310100");
        assert_eq!(customer.external_customer_id, "cus_mock_1");
    }

    #[tokio::test]
    async fn dependents_are_persisted() {
        let fx = Fixture::new();
        let mut form = fx.form("PIX");
        form.dependents.push(DependentForm {
            name: "Bia Lima".to_string(),
            cpf: "111.444.777-35".to_string(),
            birth_date: "2015-01-01".to_string(),
            gender: 2,
            kinship: "child".to_string(),
        });

        fx.handler().handle(form).await.unwrap();
        assert_eq!(fx.dependents.count(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validation_failure_is_domain_error_without_gateway_call() {
        let fx = Fixture::new();
        let err = fx
            .handler_with(Arc::new(RejectingValidator))
            .handle(fx.form("PIX"))
            .await
            .unwrap_err();

        assert!(err.is_domain());
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_plan_is_domain_error() {
        let fx = Fixture::new();
        let mut form = fx.form("PIX");
        form.plan_id = PlanId::new().to_string();

        let err = fx.handler().handle(form).await.unwrap_err();
        assert!(matches!(err, CheckoutError::PlanNotFound(_)));
        assert!(fx.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_writes_nothing() {
        let fx = Fixture::new();
        fx.gateway
            .fail_method("subscribe_pix", PaymentError::provider("pix unavailable"));

        let err = fx.handler().handle(fx.form("PIX")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentFailed { .. }));
        assert!(err.is_domain());
        assert_eq!(fx.customers.count(), 0);
        assert_eq!(fx.subscriptions.count(), 0);
        assert!(fx.gateway.cancelled().is_empty());
    }

    #[tokio::test]
    async fn subscription_failure_deletes_customer_and_cancels_charge() {
        let fx = Fixture::new();
        fx.subscriptions.faults().fail("create");

        let err = fx.handler().handle(fx.form("PIX")).await.unwrap_err();

        assert!(err.is_technical());
        assert!(matches!(
            &err,
            CheckoutError::Persistence { step, .. } if step == "persist_subscription"
        ));
        assert_eq!(fx.customers.count(), 0);
        assert_eq!(fx.subscriptions.count(), 0);
        assert_eq!(fx.gateway.cancelled(), vec!["sub_mock_2".to_string()]);
    }

    #[tokio::test]
    async fn customer_failure_cancels_charge_only() {
        let fx = Fixture::new();
        fx.customers.faults().fail("create");

        let err = fx.handler().handle(fx.form("PIX")).await.unwrap_err();

        assert!(err.is_technical());
        assert_eq!(fx.gateway.calls_to("cancel_subscription"), 1);
        assert_eq!(fx.subscriptions.count(), 0);
    }

    #[tokio::test]
    async fn dependent_failure_rolls_back_subscription_and_customer() {
        let fx = Fixture::new();
        fx.dependents.faults().fail("create");
        let mut form = fx.form("PIX");
        form.dependents.push(DependentForm {
            name: "Bia Lima".to_string(),
            cpf: "11144477735".to_string(),
            birth_date: "2015-01-01".to_string(),
            gender: 2,
            kinship: "CHILD".to_string(),
        });

        let err = fx.handler().handle(form).await.unwrap_err();

        assert!(matches!(
            &err,
            CheckoutError::Persistence { step, .. } if step == "persist_dependents"
        ));
        assert_eq!(fx.customers.count(), 0);
        assert_eq!(fx.subscriptions.count(), 0);
    }

    #[tokio::test]
    async fn compensation_failure_still_returns_original_technical_error() {
        let fx = Fixture::new();
        fx.subscriptions.faults().fail("create");
        fx.customers.faults().fail("delete");

        let err = fx.handler().handle(fx.form("PIX")).await.unwrap_err();

        assert!(matches!(
            &err,
            CheckoutError::Persistence { step, .. } if step == "persist_subscription"
        ));
        // The customer row survives because its compensation failed.
        assert_eq!(fx.customers.count(), 1);
    }

    #[tokio::test]
    async fn card_method_without_card_is_rejected() {
        let fx = Fixture::new();
        let mut form = fx.form("CREDIT_CARD");
        form.card = None;

        let err = fx.handler().handle(form).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ValidationFailed { ref field, .. } if field == "card"));
    }
}
