//! Integration tests for the signup lifecycle behind the HTTP layer.
//!
//! These tests drive the application handlers against the in-memory stores
//! and broker:
//! 1. Checkout, payment confirmation, queue hand-off and enrollment
//! 2. Poison and failing messages land on the dead-letter queue
//! 3. Broker outages never undo an activation
//! 4. Unpaid PIX signups expire

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use serde_json::json;

use benefit_checkout::adapters::gateway::MockPaymentGateway;
use benefit_checkout::adapters::memory::{
    InMemoryCustomerRepository, InMemoryDependentRepository, InMemoryPlanRepository,
    InMemorySubscriptionRepository,
};
use benefit_checkout::adapters::queue::{
    declare_topology, ActivationWorker, InMemoryBroker, QueueActivationPublisher, Settlement,
    WorkerConfig,
};
use benefit_checkout::adapters::validation::RuleBasedCheckoutValidator;
use benefit_checkout::application::handlers::{
    EnrollBeneficiaryHandler, ExpirePixSubscriptionsHandler, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ProcessCheckoutHandler, ProviderRegistry, WebhookOutcome,
    DEFAULT_PIX_TTL,
};
use benefit_checkout::domain::activation::{
    sign_payload, ActivationMessage, ActivationOrigin, WebhookVerifier,
};
use benefit_checkout::domain::checkout::{
    Address, CardForm, CheckoutForm, CustomerStatus, Plan, ProviderCode, SubscriptionStatus,
};
use benefit_checkout::domain::foundation::{PlanId, Timestamp};
use benefit_checkout::ports::{
    BenefitProvider, Enrollment, EnrollmentError, MessageBroker, OutgoingMessage, QueueTopology,
};

const SECRET: &str = "whsec_flow";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Provider that records enrollments and rejects one configured CPF.
#[derive(Default)]
struct RecordingProvider {
    enrolled: Mutex<Vec<String>>,
    reject_cpf: Option<String>,
}

#[async_trait]
impl BenefitProvider for RecordingProvider {
    fn code(&self) -> ProviderCode {
        ProviderCode::doc24()
    }

    async fn enroll(&self, message: &ActivationMessage) -> Result<Enrollment, EnrollmentError> {
        if self.reject_cpf.as_deref() == Some(message.cpf.as_str()) {
            return Err(EnrollmentError::Rejected {
                status: 422,
                body: "beneficiario ja cadastrado".to_string(),
            });
        }
        self.enrolled.lock().unwrap().push(message.cpf.clone());
        Ok(Enrollment {
            provider_member_id: format!("D24-{}", message.cpf),
        })
    }
}

struct Flow {
    plan: Plan,
    customers: Arc<InMemoryCustomerRepository>,
    subscriptions: Arc<InMemorySubscriptionRepository>,
    broker: Arc<InMemoryBroker>,
    topology: QueueTopology,
    provider: Arc<RecordingProvider>,
    checkout: ProcessCheckoutHandler,
    webhook: HandlePaymentWebhookHandler,
    worker: ActivationWorker,
    expiry: ExpirePixSubscriptionsHandler,
}

impl Flow {
    async fn new(provider: RecordingProvider) -> Self {
        let plan = Plan {
            id: PlanId::new(),
            name: "Saúde em Dia Individual".to_string(),
            price_cents: 2990,
            provider: ProviderCode::doc24(),
            provider_plan_code: "ligue saude em dia individual".to_string(),
            active: true,
        };
        let plans = Arc::new(InMemoryPlanRepository::with_plans([plan.clone()]));
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());

        let broker = Arc::new(InMemoryBroker::new());
        let topology = QueueTopology::default();
        declare_topology(broker.as_ref(), &topology).await.unwrap();

        let checkout = ProcessCheckoutHandler::new(
            Arc::new(RuleBasedCheckoutValidator::new()),
            plans.clone(),
            Arc::new(MockPaymentGateway::new()),
            customers.clone(),
            subscriptions.clone(),
            Arc::new(InMemoryDependentRepository::new()),
        );
        let webhook = HandlePaymentWebhookHandler::new(
            Arc::new(WebhookVerifier::new(SecretString::new(SECRET.to_string()))),
            customers.clone(),
            subscriptions.clone(),
            plans,
            Arc::new(QueueActivationPublisher::new(
                broker.clone() as Arc<dyn MessageBroker>,
                topology.clone(),
            )),
        );

        let provider = Arc::new(provider);
        let enroll = EnrollBeneficiaryHandler::new(
            ProviderRegistry::new().register(provider.clone()),
            customers.clone(),
        );
        let worker = ActivationWorker::with_config(
            broker.clone(),
            Arc::new(enroll),
            topology.queue.clone(),
            WorkerConfig {
                receive_wait: Duration::from_millis(10),
                error_backoff: Duration::from_millis(1),
            },
        );
        let expiry = ExpirePixSubscriptionsHandler::new(
            subscriptions.clone(),
            customers.clone(),
            DEFAULT_PIX_TTL,
        );

        Self {
            plan,
            customers,
            subscriptions,
            broker,
            topology,
            provider,
            checkout,
            webhook,
            worker,
            expiry,
        }
    }

    fn form(&self, cpf: &str, method: &str) -> CheckoutForm {
        CheckoutForm {
            name: "Ana Paula Lima".to_string(),
            email: "ana@example.com".to_string(),
            cpf: cpf.to_string(),
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

    /// Runs a checkout and returns the gateway customer id it created.
    async fn sign_up(&self, cpf: &str, method: &str) -> String {
        let result = self.checkout.handle(self.form(cpf, method)).await.unwrap();
        self.customers
            .all()
            .into_iter()
            .find(|c| c.id == result.customer_id)
            .map(|c| c.external_customer_id)
            .unwrap()
    }

    async fn confirm_payment(&self, external_customer_id: &str) -> WebhookOutcome {
        let payload = json!({
            "event": "PAYMENT_CONFIRMED",
            "payment": {"id": "pay_1", "customer": external_customer_id}
        })
        .to_string()
        .into_bytes();
        let signature = sign_payload(SECRET, &payload);
        self.webhook
            .handle(HandlePaymentWebhookCommand {
                payload,
                signature: Some(signature),
            })
            .await
            .unwrap()
    }
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn paid_signup_is_enrolled_and_provider_id_stored() {
    let flow = Flow::new(RecordingProvider::default()).await;
    let external_id = flow.sign_up("529.982.247-25", "PIX").await;

    let outcome = flow.confirm_payment(&external_id).await;
    assert!(matches!(outcome, WebhookOutcome::Activated { published: true, .. }));
    assert_eq!(flow.broker.ready_count(&flow.topology.queue), 1);

    let settlement = flow.worker.process_next().await.unwrap();
    assert_eq!(settlement, Some(Settlement::Acked));

    let customer = &flow.customers.all()[0];
    assert_eq!(customer.status, CustomerStatus::Active);
    assert_eq!(customer.provider_id.as_deref(), Some("D24-52998224725"));
    assert_eq!(flow.subscriptions.all()[0].status, SubscriptionStatus::Active);
    assert_eq!(*flow.provider.enrolled.lock().unwrap(), vec!["52998224725"]);
    assert_eq!(flow.broker.ready_count(&flow.topology.dead_letter_queue), 0);
}

#[tokio::test]
async fn queued_message_carries_plan_and_customer_data() {
    let flow = Flow::new(RecordingProvider::default()).await;
    let external_id = flow.sign_up("529.982.247-25", "CREDIT_CARD").await;
    flow.confirm_payment(&external_id).await;

    let bodies = flow.broker.peek(&flow.topology.queue);
    let message = ActivationMessage::from_json(&bodies[0]).unwrap();

    assert_eq!(message.plan_id, flow.plan.id);
    assert_eq!(message.provider, ProviderCode::doc24());
    assert_eq!(message.provider_plan_code, flow.plan.provider_plan_code);
    assert_eq!(message.cpf, "52998224725");
    assert_eq!(message.origin, ActivationOrigin::Webhook);
}

// =============================================================================
// Dead Letters
// =============================================================================

#[tokio::test]
async fn rejected_enrollment_is_dead_lettered_without_blocking_the_next() {
    let flow = Flow::new(RecordingProvider {
        reject_cpf: Some("52998224725".to_string()),
        ..Default::default()
    })
    .await;

    let rejected = flow.sign_up("529.982.247-25", "PIX").await;
    let accepted = flow.sign_up("111.444.777-35", "PIX").await;
    flow.confirm_payment(&rejected).await;
    flow.confirm_payment(&accepted).await;

    let first = flow.worker.process_next().await.unwrap();
    let second = flow.worker.process_next().await.unwrap();

    assert!(matches!(first, Some(Settlement::DeadLettered(_))));
    assert_eq!(second, Some(Settlement::Acked));
    assert_eq!(flow.broker.ready_count(&flow.topology.dead_letter_queue), 1);
    assert_eq!(flow.broker.ready_count(&flow.topology.queue), 0);
    assert_eq!(*flow.provider.enrolled.lock().unwrap(), vec!["11144477735"]);
}

#[tokio::test]
async fn poison_message_is_isolated() {
    let flow = Flow::new(RecordingProvider::default()).await;
    flow.broker
        .publish(
            &flow.topology.exchange,
            &flow.topology.routing_key,
            OutgoingMessage::json(b"{\"customer_id\":42}".to_vec()),
        )
        .await
        .unwrap();
    let external_id = flow.sign_up("529.982.247-25", "PIX").await;
    flow.confirm_payment(&external_id).await;

    assert_eq!(flow.worker.process_next().await.unwrap(), Some(Settlement::Malformed));
    assert_eq!(flow.worker.process_next().await.unwrap(), Some(Settlement::Acked));
    assert_eq!(flow.broker.ready_count(&flow.topology.dead_letter_queue), 1);
}

// =============================================================================
// Broker Outage
// =============================================================================

#[tokio::test]
async fn activation_survives_broker_outage() {
    let flow = Flow::new(RecordingProvider::default()).await;
    let external_id = flow.sign_up("529.982.247-25", "PIX").await;
    flow.broker.set_unavailable(true);

    let outcome = flow.confirm_payment(&external_id).await;

    assert!(matches!(outcome, WebhookOutcome::Activated { published: false, .. }));
    assert_eq!(flow.customers.all()[0].status, CustomerStatus::Active);
    assert_eq!(flow.subscriptions.all()[0].status, SubscriptionStatus::Active);
}

// =============================================================================
// PIX Expiry
// =============================================================================

#[tokio::test]
async fn unpaid_pix_signup_expires_after_the_window() {
    let flow = Flow::new(RecordingProvider::default()).await;
    flow.sign_up("529.982.247-25", "PIX").await;

    let early = flow.expiry.handle().await.unwrap();
    assert_eq!(early.subscriptions_expired, 0);

    let later = Timestamp::from_datetime(Utc::now() + chrono::Duration::minutes(31));
    let result = flow.expiry.handle_at(later).await.unwrap();

    assert_eq!(result.subscriptions_expired, 1);
    assert_eq!(result.customers_expired, 1);
    assert_eq!(flow.customers.all()[0].status, CustomerStatus::Expired);
    assert_eq!(flow.subscriptions.all()[0].status, SubscriptionStatus::Expired);
}

#[tokio::test]
async fn card_signups_never_expire() {
    let flow = Flow::new(RecordingProvider::default()).await;
    flow.sign_up("529.982.247-25", "CREDIT_CARD").await;

    let later = Timestamp::from_datetime(Utc::now() + chrono::Duration::hours(2));
    let result = flow.expiry.handle_at(later).await.unwrap();

    assert_eq!(result.subscriptions_expired, 0);
    assert_eq!(flow.customers.all()[0].status, CustomerStatus::Pending);
}
