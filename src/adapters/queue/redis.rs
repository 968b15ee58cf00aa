//! Redis-backed message broker.
//!
//! Redis data layout (all keys share a configurable prefix):
//!
//! - `{prefix}:exchanges` - hash of exchange name to kind
//! - `{prefix}:queues` - hash of queue name to JSON-encoded arguments
//! - `{prefix}:bindings:{exchange}:{routing_key}` - set of bound queues
//! - `{prefix}:ready:{queue}` - list of messages waiting (LPUSH in, RPOP out)
//! - `{prefix}:unacked:{queue}` - list of messages handed out and not settled
//! - `{prefix}:deadlines:{queue}` - sorted set of unacked messages scored by
//!   lease expiry in unix milliseconds
//!
//! `receive` moves a message from ready to unacked and records its lease in
//! one script, so a consumer crash leaves it in the unacked list instead of
//! losing it. Every `receive` first returns expired leases to the consuming
//! end of the ready list with `redelivered` set. The delivery tag is the
//! stored envelope itself.
//!
//! Settling (`ack`, requeue, dead-letter) removes the tag and pushes any
//! replacement in one script. Dead-letter targets are resolved before that
//! script runs, so a failed lookup leaves the delivery leased.
//!
//! Durability is whatever the Redis server is configured for (AOF/RDB).

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{
    BrokerError, Delivery, DeliveryTag, ExchangeKind, MessageBroker, OutgoingMessage,
    QueueArguments, ReadinessCheck,
};

const DEFAULT_PREFIX: &str = "broker";
const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// KEYS: ready, unacked, deadlines. ARGV: lease deadline (ms).
const CLAIM_SCRIPT: &str = r"
local tag = redis.call('RPOPLPUSH', KEYS[1], KEYS[2])
if tag then
  redis.call('ZADD', KEYS[3], ARGV[1], tag)
end
return tag
";

/// KEYS: deadlines, unacked, ready. ARGV: now (ms).
const RECLAIM_SCRIPT: &str = r"
local expired = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
local count = 0
for _, tag in ipairs(expired) do
  redis.call('ZREM', KEYS[1], tag)
  if redis.call('LREM', KEYS[2], 1, tag) > 0 then
    local ok, envelope = pcall(cjson.decode, tag)
    if ok then
      envelope['redelivered'] = true
      tag = cjson.encode(envelope)
    end
    redis.call('RPUSH', KEYS[3], tag)
    count = count + 1
  end
end
return count
";

/// KEYS: unacked, deadlines, then target ready lists.
/// ARGV: tag, replacement envelope, push command (LPUSH or RPUSH).
const SETTLE_SCRIPT: &str = r"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) == 0 then
  return 0
end
redis.call('ZREM', KEYS[2], ARGV[1])
for i = 3, #KEYS do
  redis.call(ARGV[3], KEYS[i], ARGV[2])
end
return 1
";

/// Stored form of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Envelope {
    id: Uuid,
    routing_key: String,
    content_type: String,
    redelivered: bool,
    /// Hex-encoded body bytes.
    body: String,
}

impl Envelope {
    fn new(routing_key: &str, message: &OutgoingMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            routing_key: routing_key.to_string(),
            content_type: message.content_type.clone(),
            redelivered: false,
            body: hex::encode(&message.body),
        }
    }

    fn encode(&self) -> Result<String, BrokerError> {
        serde_json::to_string(self)
            .map_err(|e| BrokerError::unavailable(format!("failed to encode envelope: {}", e)))
    }

    fn decode(raw: &str) -> Result<Self, BrokerError> {
        serde_json::from_str(raw)
            .map_err(|e| BrokerError::unavailable(format!("corrupt envelope in queue: {}", e)))
    }

    fn body_bytes(&self) -> Result<Vec<u8>, BrokerError> {
        hex::decode(&self.body)
            .map_err(|e| BrokerError::unavailable(format!("corrupt envelope body: {}", e)))
    }

    /// Copy routed to the dead-letter exchange, or `None` when the queue has
    /// no dead-letter exchange. Returns the exchange alongside.
    fn dead_lettered(&self, arguments: &QueueArguments) -> Option<(String, Envelope)> {
        let exchange = arguments.dead_letter_exchange.clone()?;
        let mut envelope = self.clone();
        if let Some(key) = &arguments.dead_letter_routing_key {
            envelope.routing_key = key.clone();
        }
        envelope.redelivered = false;
        Some((exchange, envelope))
    }
}

/// Lease expiry for a delivery handed out at `now_ms`.
fn lease_deadline(now_ms: i64, visibility_timeout: Duration) -> i64 {
    let timeout_ms = i64::try_from(visibility_timeout.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(timeout_ms)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Redis message broker for production deployments.
///
/// Receives poll the ready list instead of blocking the shared connection,
/// so publishes and acknowledgements are never queued behind them.
#[derive(Clone)]
pub struct RedisMessageBroker {
    conn: MultiplexedConnection,
    prefix: String,
    visibility_timeout: Duration,
    poll_interval: Duration,
    claim: Script,
    reclaim: Script,
    settle: Script,
}

impl RedisMessageBroker {
    /// Connects to Redis at `url`.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url).map_err(redis_error)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(redis_error)?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            prefix: DEFAULT_PREFIX.to_string(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            claim: Script::new(CLAIM_SCRIPT),
            reclaim: Script::new(RECLAIM_SCRIPT),
            settle: Script::new(SETTLE_SCRIPT),
        }
    }

    /// Use a key prefix other than `broker`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// How long a delivery may stay unsettled before it is handed out again.
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Pause between empty polls while `receive` waits.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// PING for readiness checks.
    pub async fn ping(&self) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    fn exchanges_key(&self) -> String {
        format!("{}:exchanges", self.prefix)
    }

    fn queues_key(&self) -> String {
        format!("{}:queues", self.prefix)
    }

    fn bindings_key(&self, exchange: &str, routing_key: &str) -> String {
        format!("{}:bindings:{}:{}", self.prefix, exchange, routing_key)
    }

    fn ready_key(&self, queue: &str) -> String {
        format!("{}:ready:{}", self.prefix, queue)
    }

    fn unacked_key(&self, queue: &str) -> String {
        format!("{}:unacked:{}", self.prefix, queue)
    }

    fn deadlines_key(&self, queue: &str) -> String {
        format!("{}:deadlines:{}", self.prefix, queue)
    }

    async fn queue_arguments(&self, queue: &str) -> Result<QueueArguments, BrokerError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("HGET")
            .arg(self.queues_key())
            .arg(queue)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        let raw = raw.ok_or_else(|| BrokerError::queue_not_found(queue))?;
        serde_json::from_str(&raw)
            .map_err(|e| BrokerError::unavailable(format!("corrupt queue arguments: {}", e)))
    }

    /// Queues bound to (exchange, routing key).
    async fn bound_queues(
        &self,
        exchange: &str,
        routing_key: &str,
    ) -> Result<Vec<String>, BrokerError> {
        let mut conn = self.conn.clone();

        let exists: bool = redis::cmd("HEXISTS")
            .arg(self.exchanges_key())
            .arg(exchange)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if !exists {
            return Err(BrokerError::exchange_not_found(exchange));
        }

        redis::cmd("SMEMBERS")
            .arg(self.bindings_key(exchange, routing_key))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)
    }

    /// Returns expired leases on `queue` to its ready list.
    async fn reclaim_expired(&self, queue: &str) -> Result<usize, BrokerError> {
        let mut conn = self.conn.clone();
        let reclaimed: usize = self
            .reclaim
            .key(self.deadlines_key(queue))
            .key(self.unacked_key(queue))
            .key(self.ready_key(queue))
            .arg(now_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if reclaimed > 0 {
            tracing::warn!(queue, reclaimed, "unsettled deliveries returned to queue");
        }
        Ok(reclaimed)
    }

    async fn claim(&self, queue: &str) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        self.claim
            .key(self.ready_key(queue))
            .key(self.unacked_key(queue))
            .key(self.deadlines_key(queue))
            .arg(lease_deadline(now_millis(), self.visibility_timeout))
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)
    }

    /// Removes the delivery from unacked and pushes `replacement` onto each
    /// of `targets` in one step. Fails if the delivery is not leased.
    async fn settle(
        &self,
        delivery: &Delivery,
        targets: &[String],
        replacement: Option<&str>,
        push: &str,
    ) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.settle.prepare_invoke();
        invocation
            .key(self.unacked_key(&delivery.queue))
            .key(self.deadlines_key(&delivery.queue));
        for target in targets {
            invocation.key(target);
        }
        invocation
            .arg(&delivery.tag.0)
            .arg(replacement.unwrap_or_default())
            .arg(push);

        let settled: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if settled == 0 {
            return Err(BrokerError::UnknownDelivery(short_tag(&delivery.tag)));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBroker for RedisMessageBroker {
    async fn declare_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let created: bool = redis::cmd("HSETNX")
            .arg(self.exchanges_key())
            .arg(name)
            .arg(kind.as_str())
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if created {
            return Ok(());
        }

        let existing: Option<String> = redis::cmd("HGET")
            .arg(self.exchanges_key())
            .arg(name)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        match existing {
            Some(existing) if existing != kind.as_str() => Err(BrokerError::PreconditionFailed(
                format!("exchange '{}' exists with type {}", name, existing),
            )),
            _ => Ok(()),
        }
    }

    async fn declare_queue(
        &self,
        name: &str,
        arguments: &QueueArguments,
    ) -> Result<(), BrokerError> {
        let encoded = serde_json::to_string(arguments)
            .map_err(|e| BrokerError::unavailable(format!("failed to encode arguments: {}", e)))?;

        let mut conn = self.conn.clone();
        let created: bool = redis::cmd("HSETNX")
            .arg(self.queues_key())
            .arg(name)
            .arg(&encoded)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if created {
            return Ok(());
        }

        if self.queue_arguments(name).await? != *arguments {
            return Err(BrokerError::PreconditionFailed(format!(
                "queue '{}' exists with different arguments",
                name
            )));
        }
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let exchange_exists: bool = redis::cmd("HEXISTS")
            .arg(self.exchanges_key())
            .arg(exchange)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if !exchange_exists {
            return Err(BrokerError::exchange_not_found(exchange));
        }
        let queue_exists: bool = redis::cmd("HEXISTS")
            .arg(self.queues_key())
            .arg(queue)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        if !queue_exists {
            return Err(BrokerError::queue_not_found(queue));
        }

        redis::cmd("SADD")
            .arg(self.bindings_key(exchange, routing_key))
            .arg(queue)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(redis_error)
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        message: OutgoingMessage,
    ) -> Result<(), BrokerError> {
        let queues = self.bound_queues(exchange, routing_key).await?;
        if queues.is_empty() {
            tracing::debug!(exchange, routing_key, "message matched no binding, dropped");
            return Ok(());
        }

        let encoded = Envelope::new(routing_key, &message).encode()?;
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for queue in &queues {
            pipe.cmd("LPUSH").arg(self.ready_key(queue)).arg(&encoded).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(redis_error)
    }

    async fn receive(&self, queue: &str, wait: Duration) -> Result<Option<Delivery>, BrokerError> {
        let deadline = tokio::time::Instant::now() + wait;

        let raw = loop {
            self.reclaim_expired(queue).await?;
            if let Some(raw) = self.claim(queue).await? {
                break raw;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        };

        let envelope = Envelope::decode(&raw)?;
        Ok(Some(Delivery {
            body: envelope.body_bytes()?,
            redelivered: envelope.redelivered,
            queue: queue.to_string(),
            tag: DeliveryTag(raw),
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        self.settle(delivery, &[], None, "LPUSH").await
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), BrokerError> {
        let envelope = Envelope::decode(&delivery.tag.0)?;

        if requeue {
            let mut envelope = envelope;
            envelope.redelivered = true;
            // RPUSH puts it at the consuming end of the list.
            return self
                .settle(
                    delivery,
                    &[self.ready_key(&delivery.queue)],
                    Some(&envelope.encode()?),
                    "RPUSH",
                )
                .await;
        }

        let arguments = self.queue_arguments(&delivery.queue).await?;
        let Some((exchange, dead)) = envelope.dead_lettered(&arguments) else {
            tracing::debug!(queue = %delivery.queue, "rejected message dropped, no dead-letter exchange");
            return self.settle(delivery, &[], None, "LPUSH").await;
        };

        let targets: Vec<String> = self
            .bound_queues(&exchange, &dead.routing_key)
            .await?
            .iter()
            .map(|queue| self.ready_key(queue))
            .collect();
        if targets.is_empty() {
            tracing::debug!(exchange = %exchange, "dead-lettered message matched no binding, dropped");
        }
        self.settle(delivery, &targets, Some(&dead.encode()?), "LPUSH")
            .await
    }
}

impl std::fmt::Debug for RedisMessageBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisMessageBroker")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn redis_error(e: redis::RedisError) -> BrokerError {
    BrokerError::unavailable(e.to_string())
}

/// Envelope id for log lines; the full tag carries the whole message.
fn short_tag(tag: &DeliveryTag) -> String {
    Envelope::decode(&tag.0)
        .map(|e| e.id.to_string())
        .unwrap_or_else(|_| "<unparseable>".to_string())
}

#[async_trait]
impl ReadinessCheck for RedisMessageBroker {
    fn name(&self) -> &'static str {
        "queue"
    }

    async fn check(&self) -> Result<(), DomainError> {
        self.ping()
            .await
            .map_err(|e| DomainError::new(ErrorCode::ExternalServiceError, e.to_string()))
    }
}
