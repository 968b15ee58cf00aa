//! Activation publisher port.
//!
//! The webhook trigger hands confirmed customers to the enrollment worker
//! through this port. A returned error means the message was not accepted
//! by the broker.

use crate::domain::activation::ActivationMessage;
use async_trait::async_trait;
use thiserror::Error;

use super::BrokerError;

/// Failure to hand an activation message to the queue.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode activation message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Port for enqueueing activation messages.
#[async_trait]
pub trait ActivationPublisher: Send + Sync {
    async fn publish(&self, message: &ActivationMessage) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_publisher_is_object_safe() {
        fn _accepts_dyn(_publisher: &dyn ActivationPublisher) {}
    }
}
