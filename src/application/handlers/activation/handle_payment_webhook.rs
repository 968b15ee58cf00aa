//! HandlePaymentWebhookHandler - Turns a confirmed payment into an activation.
//!
//! Sequence:
//! 1. Verify the signature over the raw body (fails closed)
//! 2. Keep only payment-confirmation events
//! 3. Resolve the customer by gateway id (unknown customers are a no-op)
//! 4. Load the latest subscription and require a plan reference
//! 5. Mark subscription and customer ACTIVE
//! 6. Load the plan and publish the activation message
//!
//! A publish failure after step 5 is logged as critical and swallowed: the
//! stored status is authoritative and reconciliation happens out of band.

use std::sync::Arc;

use crate::domain::activation::{
    ActivationMessage, ActivationOrigin, PaymentNotification, Verification, WebhookError,
    WebhookVerifier,
};
use crate::domain::checkout::{CustomerStatus, SubscriptionStatus};
use crate::domain::foundation::{CustomerId, SubscriptionId};
use crate::ports::{
    ActivationPublisher, CustomerRepository, PlanRepository, SubscriptionRepository,
};

/// Command to handle a gateway notification.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the signature header, if any.
    pub signature: Option<String>,
}

/// Result of webhook processing. Every variant answers 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Subscription activated. `published` is false when the queue refused
    /// the message.
    Activated {
        customer_id: CustomerId,
        subscription_id: SubscriptionId,
        published: bool,
    },
    /// Event outside the confirmation allow-list.
    IgnoredEvent(String),
    /// No local customer for the gateway id.
    UnknownCustomer(String),
    /// Signed body that is not a notification.
    Malformed,
}

/// Handler for payment notifications.
pub struct HandlePaymentWebhookHandler {
    verifier: Arc<WebhookVerifier>,
    customers: Arc<dyn CustomerRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    publisher: Arc<dyn ActivationPublisher>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: Arc<WebhookVerifier>,
        customers: Arc<dyn CustomerRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        publisher: Arc<dyn ActivationPublisher>,
    ) -> Self {
        Self {
            verifier,
            customers,
            subscriptions,
            plans,
            publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Verify signature over the raw bytes
        let verification = self
            .verifier
            .verify(&cmd.payload, cmd.signature.as_deref())?;

        // 2. Parse and filter
        let notification: PaymentNotification = match serde_json::from_slice(&cmd.payload) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(error = %e, "webhook body is not a payment notification");
                return Ok(WebhookOutcome::Malformed);
            }
        };

        if !notification.is_activation_event() {
            tracing::debug!(event = %notification.event, "ignoring webhook event");
            return Ok(WebhookOutcome::IgnoredEvent(notification.event));
        }

        let external_id = notification.payment.customer;
        tracing::info!(
            event = %notification.event,
            payment_id = %notification.payment.id,
            external_customer_id = %external_id,
            unsigned = verification == Verification::Unsigned,
            "processing payment confirmation"
        );

        // 3. Resolve customer
        let Some(customer) = self.customers.find_by_external_id(&external_id).await? else {
            tracing::warn!(external_customer_id = %external_id, "no customer for webhook");
            return Ok(WebhookOutcome::UnknownCustomer(external_id));
        };

        // 4. Latest subscription must reference a plan
        let subscription = self
            .subscriptions
            .find_latest_by_customer(&customer.id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(customer.id.to_string()))?;

        let plan_id = subscription
            .plan_id
            .ok_or_else(|| WebhookError::MissingPlan(subscription.id.to_string()))?;

        // 5. Activate
        self.subscriptions
            .update_status(&subscription.id, SubscriptionStatus::Active)
            .await?;
        self.customers
            .update_status(&customer.id, CustomerStatus::Active)
            .await?;

        // 6. Publish
        let plan = self
            .plans
            .find_by_id(&plan_id)
            .await?
            .ok_or_else(|| WebhookError::PlanNotFound(plan_id.to_string()))?;

        let message = ActivationMessage::for_customer(&customer, &plan, ActivationOrigin::Webhook);
        let published = match self.publisher.publish(&message).await {
            Ok(()) => {
                tracing::info!(
                    customer_id = %customer.id,
                    provider = %plan.provider,
                    "activation message published"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    critical = true,
                    customer_id = %customer.id,
                    subscription_id = %subscription.id,
                    provider = %plan.provider,
                    error = %e,
                    "subscription activated but activation message was not published"
                );
                false
            }
        };

        Ok(WebhookOutcome::Activated {
            customer_id: customer.id,
            subscription_id: subscription.id,
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCustomerRepository, InMemoryPlanRepository, InMemorySubscriptionRepository,
    };
    use crate::domain::activation::{sign_payload, SignatureMode};
    use crate::domain::checkout::{
        Address, BillingCycle, Customer, PaymentMethod, Plan, ProviderCode, Subscription,
    };
    use crate::domain::foundation::{PlanId, Timestamp};
    use crate::ports::{BrokerError, PublishError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use secrecy::SecretString;
    use std::sync::Mutex;

    const SECRET: &str = "whsec_test";

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementation
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<ActivationMessage>>,
        fail: bool,
    }

    impl RecordingPublisher {
        fn failing() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn published(&self) -> Vec<ActivationMessage> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActivationPublisher for RecordingPublisher {
        async fn publish(&self, message: &ActivationMessage) -> Result<(), PublishError> {
            if self.fail {
                return Err(BrokerError::unavailable("connection refused").into());
            }
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        customers: Arc<InMemoryCustomerRepository>,
        subscriptions: Arc<InMemorySubscriptionRepository>,
        plans: Arc<InMemoryPlanRepository>,
        publisher: Arc<RecordingPublisher>,
        customer: Customer,
        subscription: Subscription,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_publisher(RecordingPublisher::default())
        }

        fn with_publisher(publisher: RecordingPublisher) -> Self {
            let now = Timestamp::now();
            let plan = Plan {
                id: PlanId::new(),
                name: "Individual".to_string(),
                price_cents: 29900,
                provider: ProviderCode::doc24(),
                provider_plan_code: "IND-01".to_string(),
                active: true,
            };
            let customer = Customer {
                id: CustomerId::new(),
                name: "Ana Paula Lima".to_string(),
                email: "ana@example.com".to_string(),
                cpf: "52998224725".to_string(),
                phone: "11987654321".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
                gender: "F".to_string(),
                address: Address::default(),
                plan_id: plan.id,
                external_customer_id: "cus_000123".to_string(),
                provider_id: None,
                status: CustomerStatus::Pending,
                terms_accepted: true,
                created_at: now,
                updated_at: now,
            };
            let subscription = Subscription {
                id: SubscriptionId::new(),
                customer_id: customer.id,
                plan_id: Some(plan.id),
                amount_cents: 29900,
                status: SubscriptionStatus::Pending,
                payment_method: PaymentMethod::Pix,
                billing_cycle: BillingCycle::Monthly,
                next_due_date: now.date(),
                external_subscription_id: "sub_1".to_string(),
                created_at: now,
                updated_at: now,
            };

            let fx = Self {
                customers: Arc::new(InMemoryCustomerRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                plans: Arc::new(InMemoryPlanRepository::with_plans([plan])),
                publisher: Arc::new(publisher),
                customer,
                subscription,
            };
            fx.customers.insert(fx.customer.clone());
            fx.subscriptions.insert(fx.subscription.clone());
            fx
        }

        fn handler(&self, mode: SignatureMode) -> HandlePaymentWebhookHandler {
            let verifier =
                WebhookVerifier::new(SecretString::new(SECRET.to_string())).with_mode(mode);
            HandlePaymentWebhookHandler::new(
                Arc::new(verifier),
                self.customers.clone(),
                self.subscriptions.clone(),
                self.plans.clone(),
                self.publisher.clone(),
            )
        }

        fn subscription_status(&self) -> SubscriptionStatus {
            self.subscriptions.all()[0].status
        }
    }

    fn body(event: &str, customer: &str) -> Vec<u8> {
        serde_json::json!({
            "event": event,
            "payment": { "id": "pay_1", "customer": customer }
        })
        .to_string()
        .into_bytes()
    }

    fn signed(payload: Vec<u8>) -> HandlePaymentWebhookCommand {
        let signature = sign_payload(SECRET, &payload);
        HandlePaymentWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Activation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_received_activates_and_publishes_once() {
        let fx = Fixture::new();
        let outcome = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_000123")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Activated {
                customer_id: fx.customer.id,
                subscription_id: fx.subscription.id,
                published: true,
            }
        );
        assert_eq!(fx.subscription_status(), SubscriptionStatus::Active);
        assert_eq!(fx.customers.all()[0].status, CustomerStatus::Active);

        let published = fx.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].provider.as_str(), "DOC24");
        assert_eq!(published[0].origin, ActivationOrigin::Webhook);
        assert_eq!(published[0].provider_plan_code, "IND-01");
    }

    #[tokio::test]
    async fn all_confirmation_events_activate() {
        for event in ["PAYMENT_CONFIRMED", "PAYMENT_APPROVED"] {
            let fx = Fixture::new();
            let outcome = fx
                .handler(SignatureMode::Required)
                .handle(signed(body(event, "cus_000123")))
                .await
                .unwrap();
            assert!(matches!(outcome, WebhookOutcome::Activated { .. }), "{}", event);
        }
    }

    #[tokio::test]
    async fn publish_failure_still_succeeds() {
        let fx = Fixture::with_publisher(RecordingPublisher::failing());
        let outcome = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_000123")))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::Activated { published: false, .. }));
        assert_eq!(fx.subscription_status(), SubscriptionStatus::Active);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn flipped_byte_is_rejected_without_side_effects() {
        let fx = Fixture::new();
        let mut cmd = signed(body("PAYMENT_RECEIVED", "cus_000123"));
        cmd.payload[5] ^= 0x01;

        let err = fx.handler(SignatureMode::Required).handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(fx.subscription_status(), SubscriptionStatus::Pending);
        assert!(fx.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let fx = Fixture::new();
        let cmd = HandlePaymentWebhookCommand {
            payload: body("PAYMENT_RECEIVED", "cus_000123"),
            signature: None,
        };

        let err = fx.handler(SignatureMode::Required).handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature));
    }

    #[tokio::test]
    async fn unsigned_mode_accepts_missing_header_only() {
        let fx = Fixture::new();
        let handler = fx.handler(SignatureMode::AllowUnsigned);

        let wrong = HandlePaymentWebhookCommand {
            payload: body("PAYMENT_RECEIVED", "cus_000123"),
            signature: Some("00ff".to_string()),
        };
        assert!(handler.handle(wrong).await.is_err());

        let unsigned = HandlePaymentWebhookCommand {
            payload: body("PAYMENT_RECEIVED", "cus_000123"),
            signature: None,
        };
        let outcome = handler.handle(unsigned).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Activated { .. }));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // No-op Paths
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn other_events_are_ignored_without_side_effects() {
        let fx = Fixture::new();
        let outcome = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_OVERDUE", "cus_000123")))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::IgnoredEvent("PAYMENT_OVERDUE".to_string()));
        assert_eq!(fx.subscription_status(), SubscriptionStatus::Pending);
        assert!(fx.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn unknown_customer_is_noop() {
        let fx = Fixture::new();
        let outcome = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_unknown")))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::UnknownCustomer("cus_unknown".to_string()));
        assert!(fx.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn signed_garbage_is_malformed() {
        let fx = Fixture::new();
        let outcome = fx
            .handler(SignatureMode::Required)
            .handle(signed(b"not json".to_vec()))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Malformed);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Integrity Failures
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_without_plan_aborts_before_activation() {
        let fx = Fixture::new();
        let mut orphan = fx.subscription.clone();
        orphan.plan_id = None;
        fx.subscriptions.insert(orphan);

        let err = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_000123")))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MissingPlan(_)));
        assert_eq!(fx.subscription_status(), SubscriptionStatus::Pending);
        assert!(fx.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn subscription_store_failure_is_retryable() {
        let fx = Fixture::new();
        fx.subscriptions.faults().fail("find");

        let err = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_000123")))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Repository(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn customer_without_subscription_is_error() {
        let fx = Fixture::new();
        let mut lonely = fx.customer.clone();
        lonely.id = CustomerId::new();
        lonely.external_customer_id = "cus_lonely".to_string();
        fx.customers.insert(lonely);

        let err = fx
            .handler(SignatureMode::Required)
            .handle(signed(body("PAYMENT_RECEIVED", "cus_lonely")))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::SubscriptionNotFound(_)));
    }
}
