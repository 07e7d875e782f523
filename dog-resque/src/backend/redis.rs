//! Redis backend using Resque's key layout.
//!
//! Keys live under the configured namespace:
//! `queues` (set of queue names), `queue:<name>` (payload lists),
//! `job:<id>:status`, `failed` and `stat:<name>`.

use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::{debug, info};

use crate::{
    ResqueConfig, ResqueResult, JobId, JobStatus, StatusRecord, FailureRecord,
    backend::{QueueStore, StatusTracker, FailureRecorder, StatsCounter},
};

/// Finished statuses are kept for a day
const STATUS_TTL_SECS: i64 = 86_400;

/// Resque key names under one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisKeys {
    namespace: String,
}

impl RedisKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.namespace, suffix)
    }

    /// Set of every queue name pushed to
    pub fn queues(&self) -> String {
        self.keys.queues()
    }

    /// List of failure records
    pub fn failed(&self) -> String {
        self.keys.failed()
    }

    pub fn queue(&self, queue: &str) -> String {
        self.key(&format!("queue:{}", queue))
    }

    pub fn status(&self, id: &JobId) -> String {
        self.key(&format!("job:{}:status", id))
    }

    pub fn stat(&self, stat: &str) -> String {
        self.key(&format!("stat:{}", stat))
    }

    /// Queue name of a queue list key; other keys are returned unchanged
    pub fn queue_name<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.queue("").as_str()).unwrap_or(key)
    }
}

/// How a blocking pop is issued to the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BlockingPop {
    /// One LPOP per queue, without waiting
    Sweep,

    /// BLPOP with a timeout in seconds; 0 waits forever
    Wait(f64),
}

impl BlockingPop {
    pub(crate) fn for_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            None => Self::Wait(0.0),
            Some(t) if t.is_zero() => Self::Sweep,
            // Servers may truncate to whole milliseconds and treat 0 as
            // forever, so round up.
            Some(t) => Self::Wait(t.as_micros().div_ceil(1_000) as f64 / 1_000.0),
        }
    }
}

/// Redis-backed implementation of every collaborator trait
#[derive(Clone)]
pub struct RedisBackend {
    client: redis::Client,
    conn: ConnectionManager,
    keys: RedisKeys,
}

impl RedisBackend {
    /// Connect using the URL and namespace from `config`
    pub async fn connect(config: &ResqueConfig) -> ResqueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let conn = ConnectionManager::new(client.clone()).await?;
        info!("Connected to redis, namespace '{}'", config.namespace);

        Ok(Self {
            client,
            conn,
            keys: RedisKeys::new(config.namespace.clone()),
        })
    }

    /// Key names used by this backend
    pub fn keys(&self) -> &RedisKeys {
        &self.keys
    }

    async fn write_status(&self, id: &JobId, record: &StatusRecord) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let key = self.keys.status(id);
        let _: () = conn.set(&key, serde_json::to_string(record)?).await?;
        if record.status.is_terminal() {
            let _: () = conn.expire(&key, STATUS_TTL_SECS).await?;
        }
        Ok(())
    }

    async fn read_status(&self, id: &JobId) -> ResqueResult<Option<StatusRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.keys.status(id)).await?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(Into::into))
            .transpose()
    }
}

#[async_trait]
impl QueueStore for RedisBackend {
    async fn push(&self, queue: &str, entry: String) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .sadd(self.keys.queues(), queue)
            .ignore()
            .rpush(self.keys.queue(queue), entry)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn pop(&self, queue: &str) -> ResqueResult<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.lpop(self.keys.queue(queue), None).await?)
    }

    async fn blocking_pop(
        &self,
        queues: &[String],
        timeout: Option<Duration>,
    ) -> ResqueResult<Option<(String, String)>> {
        let seconds = match BlockingPop::for_timeout(timeout) {
            BlockingPop::Sweep => {
                for queue in queues {
                    if let Some(entry) = self.pop(queue).await? {
                        return Ok(Some((queue.clone(), entry)));
                    }
                }
                return Ok(None);
            }
            BlockingPop::Wait(seconds) => seconds,
        };

        let keys: Vec<String> = queues.iter().map(|q| self.keys.queue(q)).collect();

        // BLPOP parks its connection, so it gets one of its own.
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let popped: Option<(String, String)> = conn.blpop(keys, seconds).await?;

        Ok(popped.map(|(key, entry)| {
            let queue = self.keys.queue_name(&key).to_string();
            debug!("Popped entry from '{}'", queue);
            (queue, entry)
        }))
    }

    async fn size(&self, queue: &str) -> ResqueResult<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(self.keys.queue(queue)).await?)
    }

    async fn queues(&self) -> ResqueResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut names: Vec<String> = conn.smembers(self.keys.queues()).await?;
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl StatusTracker for RedisBackend {
    async fn init(&self, id: &JobId) -> ResqueResult<()> {
        self.write_status(id, &StatusRecord::waiting(Utc::now())).await
    }

    async fn update(&self, id: &JobId, status: JobStatus) -> ResqueResult<()> {
        let Some(mut record) = self.read_status(id).await? else {
            return Ok(());
        };
        record.transition(status, Utc::now());
        self.write_status(id, &record).await
    }

    async fn get(&self, id: &JobId) -> ResqueResult<Option<JobStatus>> {
        Ok(self.read_status(id).await?.map(|record| record.status))
    }

    async fn is_tracking(&self, id: &JobId) -> ResqueResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(self.keys.status(id)).await?)
    }

    async fn stop(&self, id: &JobId) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.keys.status(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl FailureRecorder for RedisBackend {
    async fn record(&self, failure: FailureRecord) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.rpush(self.keys.failed(), serde_json::to_string(&failure)?).await?;
        Ok(())
    }

    async fn count(&self) -> ResqueResult<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.llen(self.keys.failed()).await?)
    }

    async fn all(&self) -> ResqueResult<Vec<FailureRecord>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.lrange(self.keys.failed(), 0, -1).await?;
        raw.iter()
            .map(|entry| serde_json::from_str(entry).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl StatsCounter for RedisBackend {
    async fn incr(&self, stat: &str, by: u64) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.incr(self.keys.stat(stat), by).await?;
        Ok(())
    }

    async fn decr(&self, stat: &str, by: u64) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.decr(self.keys.stat(stat), by).await?;
        Ok(())
    }

    async fn get(&self, stat: &str) -> ResqueResult<i64> {
        let mut conn = self.conn.clone();
        let value: Option<i64> = conn.get(self.keys.stat(stat)).await?;
        Ok(value.unwrap_or(0))
    }

    async fn clear(&self, stat: &str) -> ResqueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.keys.stat(stat)).await?;
        Ok(())
    }
}
