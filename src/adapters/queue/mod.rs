//! Activation queue adapters.
//!
//! - `InMemoryBroker` / `RedisMessageBroker` - `MessageBroker` implementations
//! - `declare_topology` - startup declaration of exchanges, queues and bindings
//! - `QueueActivationPublisher` - producer side (`ActivationPublisher`)
//! - `ActivationWorker` - consumer side, manual acknowledgement

mod in_memory;
mod producer;
mod redis;
mod topology;
mod worker;

pub use self::redis::RedisMessageBroker;
pub use in_memory::InMemoryBroker;
pub use producer::QueueActivationPublisher;
pub use topology::declare_topology;
pub use worker::{ActivationWorker, Settlement, WorkerConfig};
