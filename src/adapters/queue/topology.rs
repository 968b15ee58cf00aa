//! Startup declaration of the activation queue topology.

use crate::ports::{BrokerError, ExchangeKind, MessageBroker, QueueArguments, QueueTopology};

/// Declares both exchanges, both queues and both bindings.
///
/// Safe to run on every start: re-declaring identical objects is a no-op,
/// while a queue that exists with different arguments fails with
/// `PreconditionFailed`.
pub async fn declare_topology(
    broker: &dyn MessageBroker,
    topology: &QueueTopology,
) -> Result<(), BrokerError> {
    // Dead-letter side first so the work queue's DLX target exists.
    broker
        .declare_exchange(&topology.dead_letter_exchange, ExchangeKind::Direct)
        .await?;
    broker
        .declare_queue(&topology.dead_letter_queue, &QueueArguments::default())
        .await?;
    broker
        .bind_queue(
            &topology.dead_letter_queue,
            &topology.dead_letter_exchange,
            &topology.routing_key,
        )
        .await?;

    broker
        .declare_exchange(&topology.exchange, ExchangeKind::Direct)
        .await?;
    broker
        .declare_queue(&topology.queue, &topology.work_queue_arguments())
        .await?;
    broker
        .bind_queue(&topology.queue, &topology.exchange, &topology.routing_key)
        .await?;

    tracing::info!(
        exchange = %topology.exchange,
        queue = %topology.queue,
        dead_letter_queue = %topology.dead_letter_queue,
        "activation queue topology declared"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::queue::InMemoryBroker;
    use crate::ports::OutgoingMessage;

    #[tokio::test]
    async fn dead_letter_exchange_reaches_dead_letter_queue() {
        let broker = InMemoryBroker::new();
        let topology = QueueTopology::default();
        declare_topology(&broker, &topology).await.unwrap();

        broker
            .publish(
                &topology.dead_letter_exchange,
                &topology.routing_key,
                OutgoingMessage::json(b"{}".to_vec()),
            )
            .await
            .unwrap();

        assert_eq!(broker.ready_count(&topology.dead_letter_queue), 1);
        assert_eq!(broker.ready_count(&topology.queue), 0);
    }

    #[tokio::test]
    async fn custom_names_are_honored() {
        let broker = InMemoryBroker::new();
        let topology = QueueTopology {
            exchange: "ex.test".to_string(),
            queue: "q.test".to_string(),
            dead_letter_exchange: "ex.test.dlx".to_string(),
            dead_letter_queue: "q.test.dlq".to_string(),
            routing_key: "k.test".to_string(),
        };
        declare_topology(&broker, &topology).await.unwrap();

        broker
            .publish("ex.test", "k.test", OutgoingMessage::json(b"{}".to_vec()))
            .await
            .unwrap();
        assert_eq!(broker.ready_count("q.test"), 1);
    }
}
