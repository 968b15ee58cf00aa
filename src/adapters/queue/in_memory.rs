//! In-memory message broker.
//!
//! Follows the same delivery contract as the Redis broker: direct-exchange
//! routing, per-queue ready and unacked sets, requeue to the head of the
//! queue, dead-lettering through the queue's `x-dead-letter-exchange`, and
//! leases that return unsettled deliveries after the visibility timeout.
//! Used by tests and by local runs without Redis.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::ports::{
    BrokerError, Delivery, DeliveryTag, ExchangeKind, MessageBroker, OutgoingMessage,
    QueueArguments,
};

#[derive(Debug, Clone)]
struct StoredMessage {
    routing_key: String,
    body: Vec<u8>,
    redelivered: bool,
}

#[derive(Debug)]
struct Lease {
    message: StoredMessage,
    expires: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    arguments: QueueArguments,
    ready: VecDeque<StoredMessage>,
    unacked: HashMap<DeliveryTag, Lease>,
}

impl QueueState {
    /// Moves leases expired at `now` back to the head of the queue.
    fn reclaim_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<DeliveryTag> = self
            .unacked
            .iter()
            .filter(|(_, lease)| lease.expires <= now)
            .map(|(tag, _)| tag.clone())
            .collect();
        for tag in &expired {
            if let Some(mut lease) = self.unacked.remove(tag) {
                lease.message.redelivered = true;
                self.ready.push_front(lease.message);
            }
        }
        expired.len()
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.unacked.values().map(|lease| lease.expires).min()
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeKind>,
    queues: HashMap<String, QueueState>,
    /// (exchange, routing key) -> bound queues
    bindings: HashMap<(String, String), HashSet<String>>,
    next_tag: u64,
}

impl BrokerState {
    fn route(&mut self, exchange: &str, message: StoredMessage) -> Result<usize, BrokerError> {
        if !self.exchanges.contains_key(exchange) {
            return Err(BrokerError::exchange_not_found(exchange));
        }

        let targets: Vec<String> = self
            .bindings
            .get(&(exchange.to_string(), message.routing_key.clone()))
            .map(|queues| queues.iter().cloned().collect())
            .unwrap_or_default();

        for queue in &targets {
            if let Some(state) = self.queues.get_mut(queue) {
                state.ready.push_back(message.clone());
            }
        }
        Ok(targets.len())
    }
}

/// Broker that keeps everything in process memory.
#[derive(Debug)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
    arrivals: Notify,
    unavailable: AtomicBool,
    visibility_timeout: Duration,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self {
            state: Mutex::default(),
            arrivals: Notify::new(),
            unavailable: AtomicBool::new(false),
            visibility_timeout: Duration::from_secs(300),
        }
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a delivery may stay unsettled before it is handed out again.
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Makes every operation fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Messages waiting in `queue`.
    pub fn ready_count(&self, queue: &str) -> usize {
        self.lock()
            .map(|s| s.queues.get(queue).map_or(0, |q| q.ready.len()))
            .unwrap_or(0)
    }

    /// Messages handed out from `queue` and not yet acked or nacked.
    pub fn unacked_count(&self, queue: &str) -> usize {
        self.lock()
            .map(|s| s.queues.get(queue).map_or(0, |q| q.unacked.len()))
            .unwrap_or(0)
    }

    /// Bodies waiting in `queue`, oldest first.
    pub fn peek(&self, queue: &str) -> Vec<Vec<u8>> {
        self.lock()
            .map(|s| {
                s.queues
                    .get(queue)
                    .map(|q| q.ready.iter().map(|m| m.body.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BrokerState>, BrokerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BrokerError::unavailable("broker marked unavailable"));
        }
        self.state
            .lock()
            .map_err(|_| BrokerError::unavailable("broker state lock poisoned"))
    }

    /// Takes the next ready message, or returns the earliest lease expiry
    /// on the queue so the caller knows when to look again.
    fn try_take(&self, queue: &str) -> Result<Result<Delivery, Option<Instant>>, BrokerError> {
        let now = Instant::now();
        let mut state = self.lock()?;
        state.next_tag += 1;
        let tag = DeliveryTag(state.next_tag.to_string());

        let queue_state = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::queue_not_found(queue))?;

        let reclaimed = queue_state.reclaim_expired(now);
        if reclaimed > 0 {
            tracing::warn!(queue, reclaimed, "unsettled deliveries returned to queue");
        }

        let Some(message) = queue_state.ready.pop_front() else {
            return Ok(Err(queue_state.next_expiry()));
        };

        let delivery = Delivery {
            tag: tag.clone(),
            queue: queue.to_string(),
            body: message.body.clone(),
            redelivered: message.redelivered,
        };
        queue_state.unacked.insert(
            tag,
            Lease {
                message,
                expires: now + self.visibility_timeout,
            },
        );
        Ok(Ok(delivery))
    }

    /// Removes the delivery's lease, failing if it is not held.
    fn settle(
        state: &mut BrokerState,
        delivery: &Delivery,
    ) -> Result<StoredMessage, BrokerError> {
        state
            .queues
            .get_mut(&delivery.queue)
            .ok_or_else(|| BrokerError::queue_not_found(&delivery.queue))?
            .unacked
            .remove(&delivery.tag)
            .map(|lease| lease.message)
            .ok_or_else(|| BrokerError::UnknownDelivery(delivery.tag.to_string()))
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        match state.exchanges.get(name) {
            Some(existing) if *existing != kind => Err(BrokerError::PreconditionFailed(format!(
                "exchange '{}' exists with type {}",
                name,
                existing.as_str()
            ))),
            Some(_) => Ok(()),
            None => {
                state.exchanges.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    async fn declare_queue(
        &self,
        name: &str,
        arguments: &QueueArguments,
    ) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        match state.queues.get(name) {
            Some(existing) if existing.arguments != *arguments => Err(
                BrokerError::PreconditionFailed(format!(
                    "queue '{}' exists with different arguments",
                    name
                )),
            ),
            Some(_) => Ok(()),
            None => {
                state.queues.insert(
                    name.to_string(),
                    QueueState {
                        arguments: arguments.clone(),
                        ..Default::default()
                    },
                );
                Ok(())
            }
        }
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        if !state.exchanges.contains_key(exchange) {
            return Err(BrokerError::exchange_not_found(exchange));
        }
        if !state.queues.contains_key(queue) {
            return Err(BrokerError::queue_not_found(queue));
        }
        state
            .bindings
            .entry((exchange.to_string(), routing_key.to_string()))
            .or_default()
            .insert(queue.to_string());
        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutgoingMessage,
    ) -> Result<(), BrokerError> {
        let routed = {
            let mut state = self.lock()?;
            state.route(
                exchange,
                StoredMessage {
                    routing_key: routing_key.to_string(),
                    body: message.body,
                    redelivered: false,
                },
            )?
        };

        if routed == 0 {
            tracing::debug!(exchange, routing_key, "message matched no binding, dropped");
        } else {
            self.arrivals.notify_waiters();
        }
        Ok(())
    }

    async fn receive(&self, queue: &str, wait: Duration) -> Result<Option<Delivery>, BrokerError> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_expiry = match self.try_take(queue)? {
                Ok(delivery) => return Ok(Some(delivery)),
                Err(next_expiry) => next_expiry,
            };

            let wake_at = next_expiry.map_or(deadline, |expiry| expiry.min(deadline));
            if tokio::time::timeout_at(wake_at, notified).await.is_err() && wake_at >= deadline {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        Self::settle(&mut state, delivery).map(|_| ())
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), BrokerError> {
        let mut state = self.lock()?;
        let arguments = state
            .queues
            .get(&delivery.queue)
            .map(|q| q.arguments.clone())
            .unwrap_or_default();
        // An undeclared dead-letter exchange keeps the delivery leased.
        if let Some(dlx) = arguments.dead_letter_exchange.as_deref() {
            if !requeue && !state.exchanges.contains_key(dlx) {
                return Err(BrokerError::exchange_not_found(dlx));
            }
        }
        let mut message = Self::settle(&mut state, delivery)?;

        if requeue {
            message.redelivered = true;
            if let Some(queue) = state.queues.get_mut(&delivery.queue) {
                queue.ready.push_front(message);
            }
            drop(state);
            self.arrivals.notify_waiters();
            return Ok(());
        }

        let Some(dlx) = arguments.dead_letter_exchange else {
            tracing::debug!(queue = %delivery.queue, "rejected message dropped, no dead-letter exchange");
            return Ok(());
        };

        if let Some(key) = arguments.dead_letter_routing_key {
            message.routing_key = key;
        }
        message.redelivered = false;
        state.route(&dlx, message)?;
        drop(state);
        self.arrivals.notify_waiters();
        Ok(())
    }
}
