//! Activation producer: publishes activation messages to the work exchange.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::activation::ActivationMessage;
use crate::ports::{ActivationPublisher, MessageBroker, OutgoingMessage, PublishError, QueueTopology};

/// Publishes JSON activation messages.
pub struct QueueActivationPublisher {
    broker: Arc<dyn MessageBroker>,
    topology: QueueTopology,
}

impl QueueActivationPublisher {
    pub fn new(broker: Arc<dyn MessageBroker>, topology: QueueTopology) -> Self {
        Self { broker, topology }
    }
}

#[async_trait]
impl ActivationPublisher for QueueActivationPublisher {
    async fn publish(&self, message: &ActivationMessage) -> Result<(), PublishError> {
        let body = message.to_json()?;
        self.broker
            .publish(
                &self.topology.exchange,
                &self.topology.routing_key,
                OutgoingMessage::json(body),
            )
            .await?;

        tracing::debug!(
            customer_id = %message.customer_id,
            provider = %message.provider,
            exchange = %self.topology.exchange,
            "activation message enqueued"
        );
        Ok(())
    }
}
