//! Message broker port.
//!
//! Models the subset of AMQP-style semantics the activation pipeline relies
//! on: durable direct exchanges, durable queues with dead-letter arguments,
//! bindings by routing key, and manual acknowledgement. Every published
//! message is stored durably; there is no transient delivery mode.
//!
//! # Delivery contract
//!
//! - `receive` hands out each ready message to exactly one consumer and keeps
//!   it unacknowledged until `ack` or `nack`.
//! - A delivery left unsettled past the broker's visibility timeout (consumer
//!   crash, failed settle) goes back to the queue with `redelivered` set.
//! - `nack` with `requeue = false` routes the message to the queue's
//!   dead-letter exchange when one is configured, otherwise drops it.
//! - `nack` with `requeue = true` puts the message back at the head of the
//!   queue with `redelivered` set.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Names of every broker object the activation pipeline uses.
///
/// Built once at startup and handed to both producer and consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTopology {
    /// Exchange the producer publishes to.
    pub exchange: String,
    /// Primary work queue.
    pub queue: String,
    /// Exchange receiving rejected messages.
    pub dead_letter_exchange: String,
    /// Queue bound to the dead-letter exchange.
    pub dead_letter_queue: String,
    /// Routing key binding both queues.
    pub routing_key: String,
}

impl Default for QueueTopology {
    fn default() -> Self {
        Self {
            exchange: "ex.checkout".to_string(),
            queue: "q.activations".to_string(),
            dead_letter_exchange: "ex.dlx".to_string(),
            dead_letter_queue: "q.activations.dlq".to_string(),
            routing_key: "k.activation".to_string(),
        }
    }
}

impl QueueTopology {
    /// Arguments the primary queue is declared with.
    pub fn work_queue_arguments(&self) -> QueueArguments {
        QueueArguments {
            dead_letter_exchange: Some(self.dead_letter_exchange.clone()),
            dead_letter_routing_key: Some(self.routing_key.clone()),
        }
    }
}

/// Exchange routing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Routes to queues bound with exactly the message's routing key.
    Direct,
}

impl ExchangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeKind::Direct => "direct",
        }
    }
}

/// Optional `x-` arguments of a queue declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueArguments {
    /// `x-dead-letter-exchange`
    pub dead_letter_exchange: Option<String>,
    /// `x-dead-letter-routing-key`
    pub dead_letter_routing_key: Option<String>,
}

/// Message handed to `publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl OutgoingMessage {
    /// JSON message.
    pub fn json(body: Vec<u8>) -> Self {
        Self {
            content_type: "application/json".to_string(),
            body,
        }
    }
}

/// Broker-assigned handle of an unacknowledged delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryTag(pub String);

impl std::fmt::Display for DeliveryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message received from a queue, awaiting ack or nack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: DeliveryTag,
    pub queue: String,
    pub body: Vec<u8>,
    /// True when this message was handed out before and requeued or reclaimed.
    pub redelivered: bool,
}

/// Broker failures.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// Broker unreachable or connection dropped.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// Referenced exchange or queue was never declared.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Re-declaration with arguments that differ from the existing object.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Ack/nack for a tag that is not outstanding.
    #[error("unknown delivery tag {0}")]
    UnknownDelivery(String),
}

impl BrokerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        BrokerError::Unavailable(message.into())
    }

    pub fn exchange_not_found(name: impl Into<String>) -> Self {
        BrokerError::NotFound {
            kind: "exchange",
            name: name.into(),
        }
    }

    pub fn queue_not_found(name: impl Into<String>) -> Self {
        BrokerError::NotFound {
            kind: "queue",
            name: name.into(),
        }
    }
}

/// Port for the durable message broker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declares a durable exchange. Re-declaring with the same kind is a no-op.
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), BrokerError>;

    /// Declares a durable queue. Re-declaring with the same arguments is a no-op.
    async fn declare_queue(&self, name: &str, arguments: &QueueArguments)
        -> Result<(), BrokerError>;

    /// Binds a queue to an exchange under a routing key.
    async fn bind_queue(&self, queue: &str, exchange: &str, routing_key: &str)
        -> Result<(), BrokerError>;

    /// Publishes a message. Messages matching no binding are dropped.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutgoingMessage,
    ) -> Result<(), BrokerError>;

    /// Waits up to `wait` for the next ready message of `queue`.
    async fn receive(&self, queue: &str, wait: Duration) -> Result<Option<Delivery>, BrokerError>;

    /// Acknowledges a delivery, removing it for good.
    async fn ack(&self, delivery: &Delivery) -> Result<(), BrokerError>;

    /// Negatively acknowledges a delivery.
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_broker_is_object_safe() {
        fn _accepts_dyn(_broker: &dyn MessageBroker) {}
    }

    #[test]
    fn default_topology_uses_fixed_names() {
        let topology = QueueTopology::default();
        assert_eq!(topology.exchange, "ex.checkout");
        assert_eq!(topology.queue, "q.activations");
        assert_eq!(topology.dead_letter_exchange, "ex.dlx");
        assert_eq!(topology.dead_letter_queue, "q.activations.dlq");
        assert_eq!(topology.routing_key, "k.activation");
    }

    #[test]
    fn work_queue_dead_letters_to_dlx() {
        let args = QueueTopology::default().work_queue_arguments();
        assert_eq!(args.dead_letter_exchange.as_deref(), Some("ex.dlx"));
        assert_eq!(args.dead_letter_routing_key.as_deref(), Some("k.activation"));
    }

    #[test]
    fn json_message_is_tagged_as_json() {
        let message = OutgoingMessage::json(b"{}".to_vec());
        assert_eq!(message.content_type, "application/json");
        assert_eq!(message.body, b"{}");
    }

    #[test]
    fn broker_error_messages() {
        assert_eq!(
            BrokerError::queue_not_found("q.x").to_string(),
            "queue 'q.x' not found"
        );
    }
}
