//! Abstraction over the durable job broker used to hand send-jobs from the
//! API to the worker.
//!
//! The source this service is modeled after depends on a specific
//! Redis-backed queue with retry semantics; this module names the contract
//! instead of leaking the broker's wire format into callers: durability
//! (a job survives a process crash once `enqueue` returns) and dedup-by-job-id
//! (re-enqueuing the same `job_id` while it is pending or in-flight is a
//! no-op) are the properties callers may rely on.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to (de)serialize job payload: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct EnqueueOptions {
    /// total attempts (including the first) the consumer should make
    /// before giving up on a job
    pub max_attempts: u32,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    job_id: String,
    attempt: u32,
    max_attempts: u32,
    payload: serde_json::Value,
}

/// A single delivery popped off the queue, ready to be processed and then
/// either dropped (success) or handed back to [`JobQueue::retry`] (failure).
#[derive(Debug)]
pub struct Delivery {
    pub job_id: String,
    pub attempt: u32,
    pub max_attempts: u32,
    payload: serde_json::Value,
}

impl Delivery {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, QueueError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    /// true when a further failure on this delivery should not be retried,
    /// i.e. this is the last attempt the caller is allowed to make.
    pub fn is_terminal_attempt(&self) -> bool {
        self.attempt + 1 >= self.max_attempts
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues a job durably. `job_id` is the dedup key.
    async fn enqueue(
        &self,
        job_id: &str,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<(), QueueError>;

    /// Blocks for up to `block_secs` waiting for the next delivery.
    async fn dequeue(&self, block_secs: u64) -> Result<Option<Delivery>, QueueError>;

    /// Re-enqueues a failed delivery after `delay`, bumping its attempt counter.
    /// The delivery becomes visible to `dequeue` again once the delay elapses
    /// and [`JobQueue::promote_delayed`] has run.
    async fn retry(&self, delivery: Delivery, delay: Duration) -> Result<(), QueueError>;

    /// Moves delayed retries whose backoff has elapsed back onto the main
    /// queue. The consumer loop polls this on an interval.
    async fn promote_delayed(&self) -> Result<usize, QueueError>;
}

/// Redis-backed [`JobQueue`]: a list for ready jobs, a sorted set for delayed
/// retries (scored by the epoch millisecond they become ready), and a set of
/// seen job ids for dedup.
pub struct RedisJobQueue {
    conn: ConnectionManager,
    queue_key: String,
    delayed_key: String,
    seen_key: String,
}

/// jobs dedup for this long after being seen; generous relative to the
/// queue's own message TTL since a job can be retried for minutes.
const DEDUP_TTL_SECS: i64 = 24 * 60 * 60;

impl RedisJobQueue {
    pub async fn connect(redis_url: &str, queue_name: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self {
            conn,
            queue_key: format!("mailgate:{queue_name}"),
            delayed_key: format!("mailgate:{queue_name}:delayed"),
            seen_key: format!("mailgate:{queue_name}:seen"),
        })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(
        &self,
        job_id: &str,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();

        let newly_seen: bool = conn.sadd(&self.seen_key, job_id).await?;
        conn.expire(&self.seen_key, DEDUP_TTL_SECS).await?;

        if !newly_seen {
            return Ok(());
        }

        let envelope = Envelope {
            job_id: job_id.to_owned(),
            attempt: 0,
            max_attempts: opts.max_attempts,
            payload,
        };

        let serialized = serde_json::to_string(&envelope)?;
        conn.lpush(&self.queue_key, serialized).await?;

        Ok(())
    }

    async fn dequeue(&self, block_secs: u64) -> Result<Option<Delivery>, QueueError> {
        let mut conn = self.conn.clone();

        let popped: Option<(String, String)> =
            conn.brpop(&self.queue_key, block_secs as f64).await?;

        let Some((_key, raw)) = popped else {
            return Ok(None);
        };

        let envelope: Envelope = serde_json::from_str(&raw)?;

        Ok(Some(Delivery {
            job_id: envelope.job_id,
            attempt: envelope.attempt,
            max_attempts: envelope.max_attempts,
            payload: envelope.payload,
        }))
    }

    async fn retry(&self, delivery: Delivery, delay: Duration) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();

        let envelope = Envelope {
            job_id: delivery.job_id,
            attempt: delivery.attempt + 1,
            max_attempts: delivery.max_attempts,
            payload: delivery.payload,
        };

        let ready_at_millis = chrono::Utc::now().timestamp_millis() + delay.as_millis() as i64;
        let serialized = serde_json::to_string(&envelope)?;

        conn.zadd(&self.delayed_key, serialized, ready_at_millis)
            .await?;

        Ok(())
    }

    async fn promote_delayed(&self) -> Result<usize, QueueError> {
        let mut conn = self.conn.clone();

        let now = chrono::Utc::now().timestamp_millis();
        let due: Vec<String> = conn
            .zrangebyscore(&self.delayed_key, i64::MIN, now)
            .await?;

        for member in &due {
            conn.zrem(&self.delayed_key, member).await?;
            conn.lpush(&self.queue_key, member).await?;
        }

        Ok(due.len())
    }
}
