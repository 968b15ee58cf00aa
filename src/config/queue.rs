//! Activation queue topology names

use serde::Deserialize;

use crate::ports::QueueTopology;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,

    #[serde(default = "default_queue")]
    pub queue: String,

    #[serde(default = "default_dead_letter_exchange")]
    pub dead_letter_exchange: String,

    #[serde(default = "default_dead_letter_queue")]
    pub dead_letter_queue: String,

    #[serde(default = "default_routing_key")]
    pub routing_key: String,
}

impl QueueConfig {
    pub fn topology(&self) -> QueueTopology {
        QueueTopology {
            exchange: self.exchange.clone(),
            queue: self.queue.clone(),
            dead_letter_exchange: self.dead_letter_exchange.clone(),
            dead_letter_queue: self.dead_letter_queue.clone(),
            routing_key: self.routing_key.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let names = [
            ("queue.exchange", &self.exchange),
            ("queue.queue", &self.queue),
            ("queue.dead_letter_exchange", &self.dead_letter_exchange),
            ("queue.dead_letter_queue", &self.dead_letter_queue),
            ("queue.routing_key", &self.routing_key),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyQueueName(field));
            }
        }
        if self.queue == self.dead_letter_queue {
            return Err(ValidationError::DeadLetterQueueCollision);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            queue: default_queue(),
            dead_letter_exchange: default_dead_letter_exchange(),
            dead_letter_queue: default_dead_letter_queue(),
            routing_key: default_routing_key(),
        }
    }
}

fn default_exchange() -> String {
    "ex.checkout".to_string()
}

fn default_queue() -> String {
    "q.activations".to_string()
}

fn default_dead_letter_exchange() -> String {
    "ex.dlx".to_string()
}

fn default_dead_letter_queue() -> String {
    "q.activations.dlq".to_string()
}

fn default_routing_key() -> String {
    "k.activation".to_string()
}
