//! ActivationWorker - Background consumer of the activation queue.
//!
//! One message in flight at a time, manual acknowledgement:
//!
//! | Outcome | Settlement |
//! |---------|------------|
//! | body does not decode | nack, no requeue (dead-lettered) |
//! | provider has no integration | ack |
//! | enrollment succeeded | ack (provider id write is best effort) |
//! | enrollment failed | nack, no requeue (dead-lettered) |
//!
//! ## Graceful Shutdown
//!
//! The shutdown signal is only observed while waiting for a message. A
//! message already received is processed and settled before the loop exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::handlers::{EnrollBeneficiaryHandler, EnrollmentOutcome};
use crate::domain::activation::ActivationMessage;
use crate::ports::{BrokerError, Delivery, MessageBroker};

/// Configuration for the ActivationWorker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Longest single wait for a message before re-checking shutdown.
    pub receive_wait: Duration,
    /// Pause after a broker error before trying again.
    pub error_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            receive_wait: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// How a delivery was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Enrolled and acknowledged.
    Acked,
    /// No integration for the provider; acknowledged without action.
    Skipped,
    /// Body was not an activation message; rejected without requeue.
    Malformed,
    /// Provider enrollment failed; rejected without requeue.
    DeadLettered(String),
}

/// Consumes activation messages and hands them to the enrollment handler.
pub struct ActivationWorker {
    broker: Arc<dyn MessageBroker>,
    handler: Arc<EnrollBeneficiaryHandler>,
    queue: String,
    config: WorkerConfig,
}

impl ActivationWorker {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<EnrollBeneficiaryHandler>,
        queue: impl Into<String>,
    ) -> Self {
        Self::with_config(broker, handler, queue, WorkerConfig::default())
    }

    pub fn with_config(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<EnrollBeneficiaryHandler>,
        queue: impl Into<String>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            broker,
            handler,
            queue: queue.into(),
            config,
        }
    }

    /// Run the consume loop until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(queue = %self.queue, "activation worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = self.broker.receive(&self.queue, self.config.receive_wait) => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    if let Err(e) = self.process(delivery).await {
                        tracing::warn!(
                            queue = %self.queue,
                            error = %e,
                            "failed to settle delivery, it returns after the visibility timeout"
                        );
                        tokio::time::sleep(self.config.error_backoff).await;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(queue = %self.queue, error = %e, "receive failed, backing off");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        tracing::info!(queue = %self.queue, "activation worker stopped");
    }

    /// Receives and settles at most one message.
    ///
    /// Returns `None` when the queue stayed empty for the receive wait.
    pub async fn process_next(&self) -> Result<Option<Settlement>, BrokerError> {
        match self
            .broker
            .receive(&self.queue, self.config.receive_wait)
            .await?
        {
            Some(delivery) => self.process(delivery).await.map(Some),
            None => Ok(None),
        }
    }

    async fn process(&self, delivery: Delivery) -> Result<Settlement, BrokerError> {
        // 1. Decode
        let message = match ActivationMessage::from_json(&delivery.body) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    delivery_tag = %delivery.tag,
                    error = %e,
                    "malformed activation message, dead-lettering"
                );
                self.broker.nack(&delivery, false).await?;
                return Ok(Settlement::Malformed);
            }
        };

        // 2. Enroll and settle
        match self.handler.handle(&message).await {
            Ok(EnrollmentOutcome::Enrolled { .. }) => {
                self.broker.ack(&delivery).await?;
                Ok(Settlement::Acked)
            }
            Ok(EnrollmentOutcome::UnsupportedProvider(_)) => {
                self.broker.ack(&delivery).await?;
                Ok(Settlement::Skipped)
            }
            Err(e) => {
                tracing::error!(
                    customer_id = %message.customer_id,
                    provider = %message.provider,
                    redelivered = delivery.redelivered,
                    error = %e,
                    "enrollment failed, dead-lettering"
                );
                self.broker.nack(&delivery, false).await?;
                Ok(Settlement::DeadLettered(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCustomerRepository;
    use crate::adapters::queue::{declare_topology, InMemoryBroker};
    use crate::application::handlers::ProviderRegistry;
    use crate::domain::activation::ActivationOrigin;
    use crate::domain::checkout::ProviderCode;
    use crate::domain::foundation::{CustomerId, PlanId};
    use crate::ports::{
        BenefitProvider, Enrollment, EnrollmentError, OutgoingMessage, QueueTopology,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementation
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct RecordingProvider {
        enrolled: Mutex<Vec<String>>,
        reject_cpf: Option<String>,
        /// Broker taken down during the next enrollment.
        outage: Mutex<Option<Arc<InMemoryBroker>>>,
    }

    #[async_trait]
    impl BenefitProvider for RecordingProvider {
        fn code(&self) -> ProviderCode {
            ProviderCode::doc24()
        }

        async fn enroll(&self, message: &ActivationMessage) -> Result<Enrollment, EnrollmentError> {
            if self.reject_cpf.as_deref() == Some(message.cpf.as_str()) {
                return Err(EnrollmentError::Timeout);
            }
            if let Some(broker) = self.outage.lock().unwrap().take() {
                broker.set_unavailable(true);
            }
            self.enrolled.lock().unwrap().push(message.cpf.clone());
            Ok(Enrollment {
                provider_member_id: message.cpf.clone(),
            })
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    struct Fixture {
        broker: Arc<InMemoryBroker>,
        topology: QueueTopology,
        provider: Arc<RecordingProvider>,
        worker: ActivationWorker,
    }

    async fn fixture(provider: RecordingProvider) -> Fixture {
        fixture_on(Arc::new(InMemoryBroker::new()), provider).await
    }

    async fn fixture_on(broker: Arc<InMemoryBroker>, provider: RecordingProvider) -> Fixture {
        let topology = QueueTopology::default();
        declare_topology(broker.as_ref(), &topology).await.unwrap();

        let provider = Arc::new(provider);
        let handler = EnrollBeneficiaryHandler::new(
            ProviderRegistry::new().register(provider.clone()),
            Arc::new(InMemoryCustomerRepository::new()),
        );
        let worker = ActivationWorker::with_config(
            broker.clone(),
            Arc::new(handler),
            topology.queue.clone(),
            WorkerConfig {
                receive_wait: Duration::from_millis(10),
                error_backoff: Duration::from_millis(1),
            },
        );

        Fixture {
            broker,
            topology,
            provider,
            worker,
        }
    }

    fn message(provider: &str, cpf: &str) -> ActivationMessage {
        ActivationMessage {
            customer_id: CustomerId::new(),
            plan_id: PlanId::new(),
            provider: ProviderCode::new(provider),
            provider_plan_code: "IND-01".to_string(),
            origin: ActivationOrigin::Webhook,
            name: "Ana Paula Lima".to_string(),
            email: "ana@example.com".to_string(),
            cpf: cpf.to_string(),
            phone: "11987654321".to_string(),
            birth_date: "1990-04-12".to_string(),
            gender: "F".to_string(),
        }
    }

    impl Fixture {
        async fn enqueue_raw(&self, body: &[u8]) {
            self.broker
                .publish(
                    &self.topology.exchange,
                    &self.topology.routing_key,
                    OutgoingMessage::json(body.to_vec()),
                )
                .await
                .unwrap();
        }

        async fn enqueue(&self, message: &ActivationMessage) {
            self.enqueue_raw(&message.to_json().unwrap()).await;
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Settlement
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn successful_enrollment_is_acked() {
        let fx = fixture(RecordingProvider::default()).await;
        fx.enqueue(&message("DOC24", "52998224725")).await;

        let settlement = fx.worker.process_next().await.unwrap();

        assert_eq!(settlement, Some(Settlement::Acked));
        assert_eq!(fx.broker.unacked_count(&fx.topology.queue), 0);
        assert_eq!(fx.broker.ready_count(&fx.topology.dead_letter_queue), 0);
        assert_eq!(*fx.provider.enrolled.lock().unwrap(), vec!["52998224725"]);
    }

    #[tokio::test]
    async fn malformed_message_is_dead_lettered_and_next_is_processed() {
        let fx = fixture(RecordingProvider::default()).await;
        fx.enqueue_raw(b"{not json").await;
        fx.enqueue(&message("DOC24", "52998224725")).await;

        assert_eq!(fx.worker.process_next().await.unwrap(), Some(Settlement::Malformed));
        assert_eq!(fx.worker.process_next().await.unwrap(), Some(Settlement::Acked));

        assert_eq!(fx.broker.ready_count(&fx.topology.dead_letter_queue), 1);
        assert_eq!(fx.broker.ready_count(&fx.topology.queue), 0);
    }

    #[tokio::test]
    async fn unknown_provider_is_acked_not_dead_lettered() {
        let fx = fixture(RecordingProvider::default()).await;
        fx.enqueue(&message("OTHER", "52998224725")).await;

        assert_eq!(fx.worker.process_next().await.unwrap(), Some(Settlement::Skipped));
        assert_eq!(fx.broker.ready_count(&fx.topology.dead_letter_queue), 0);
        assert!(fx.provider.enrolled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enrollment_failure_is_dead_lettered() {
        let fx = fixture(RecordingProvider {
            reject_cpf: Some("11144477735".to_string()),
            ..Default::default()
        })
        .await;
        fx.enqueue(&message("DOC24", "11144477735")).await;

        let settlement = fx.worker.process_next().await.unwrap();

        assert!(matches!(settlement, Some(Settlement::DeadLettered(_))));
        assert_eq!(fx.broker.ready_count(&fx.topology.dead_letter_queue), 1);
        assert_eq!(fx.broker.ready_count(&fx.topology.queue), 0);
    }

    #[tokio::test]
    async fn empty_queue_yields_none() {
        let fx = fixture(RecordingProvider::default()).await;
        assert_eq!(fx.worker.process_next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn delivery_whose_ack_failed_is_redelivered_and_acked() {
        let broker = Arc::new(InMemoryBroker::new().with_visibility_timeout(Duration::from_millis(50)));
        let provider = RecordingProvider {
            outage: Mutex::new(Some(broker.clone())),
            ..Default::default()
        };
        let fx = fixture_on(broker, provider).await;
        fx.enqueue(&message("DOC24", "52998224725")).await;

        let err = fx.worker.process_next().await.unwrap_err();
        assert!(matches!(err, BrokerError::Unavailable(_)));

        fx.broker.set_unavailable(false);
        assert_eq!(fx.broker.unacked_count(&fx.topology.queue), 1);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(fx.worker.process_next().await.unwrap(), Some(Settlement::Acked));
        assert_eq!(fx.broker.unacked_count(&fx.topology.queue), 0);
        assert_eq!(fx.broker.ready_count(&fx.topology.queue), 0);
        assert_eq!(fx.provider.enrolled.lock().unwrap().len(), 2);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Run Loop
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn run_drains_queue_and_stops_on_shutdown() {
        let fx = fixture(RecordingProvider::default()).await;
        fx.enqueue(&message("DOC24", "52998224725")).await;
        fx.enqueue(&message("DOC24", "11144477735")).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let Fixture {
            broker,
            topology,
            provider,
            worker,
        } = fx;
        let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

        for _ in 0..100 {
            if provider.enrolled.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop")
            .unwrap();

        assert_eq!(provider.enrolled.lock().unwrap().len(), 2);
        assert_eq!(broker.unacked_count(&topology.queue), 0);
    }
}
