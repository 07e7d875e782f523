use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    ResqueResult, JobId, JobStatus, StatusRecord, FailureRecord,
    backend::{QueueStore, StatusTracker, FailureRecorder, StatsCounter},
};

/// In-memory backend for testing and development.
///
/// Implements every collaborator trait, so one instance can back a whole
/// `QueueClient`. Clones share state.
#[derive(Clone)]
pub struct MemoryBackend {
    /// Queue storage: queue name -> encoded payloads (head first)
    pub(crate) queues: Arc<RwLock<BTreeMap<String, VecDeque<String>>>>,

    /// Status records of tracked jobs
    pub(crate) statuses: Arc<RwLock<HashMap<JobId, StatusRecord>>>,

    pub(crate) failures: Arc<RwLock<Vec<FailureRecord>>>,

    pub(crate) stats: Arc<RwLock<HashMap<String, i64>>>,

    /// Wakes blocking pops after every push
    pub(crate) pushed: Arc<Notify>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            queues: Arc::new(RwLock::new(BTreeMap::new())),
            statuses: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(HashMap::new())),
            pushed: Arc::new(Notify::new()),
        }
    }

    /// Pop the first available entry, checking queues in order
    fn pop_first(&self, queues: &[String]) -> Option<(String, String)> {
        let mut lock = self.queues.write();
        queues.iter().find_map(|name| {
            lock.get_mut(name)
                .and_then(|queue| queue.pop_front())
                .map(|entry| (name.clone(), entry))
        })
    }
}

#[async_trait]
impl QueueStore for MemoryBackend {
    async fn push(&self, queue: &str, entry: String) -> ResqueResult<()> {
        self.queues.write().entry(queue.to_string()).or_default().push_back(entry);
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn pop(&self, queue: &str) -> ResqueResult<Option<String>> {
        Ok(self.queues.write().get_mut(queue).and_then(|q| q.pop_front()))
    }

    async fn blocking_pop(
        &self,
        queues: &[String],
        timeout: Option<Duration>,
    ) -> ResqueResult<Option<(String, String)>> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            // Register for wake-ups before checking, so a push between the
            // check and the wait is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(hit) = self.pop_first(queues) {
                return Ok(Some(hit));
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        debug!("Blocking pop timed out on {:?}", queues);
                        return Ok(self.pop_first(queues));
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn size(&self, queue: &str) -> ResqueResult<usize> {
        Ok(self.queues.read().get(queue).map_or(0, VecDeque::len))
    }

    async fn queues(&self) -> ResqueResult<Vec<String>> {
        Ok(self.queues.read().keys().cloned().collect())
    }
}

#[async_trait]
impl StatusTracker for MemoryBackend {
    async fn init(&self, id: &JobId) -> ResqueResult<()> {
        self.statuses.write().insert(id.clone(), StatusRecord::waiting(Utc::now()));
        Ok(())
    }

    async fn update(&self, id: &JobId, status: JobStatus) -> ResqueResult<()> {
        if let Some(record) = self.statuses.write().get_mut(id) {
            record.transition(status, Utc::now());
        }
        Ok(())
    }

    async fn get(&self, id: &JobId) -> ResqueResult<Option<JobStatus>> {
        Ok(self.statuses.read().get(id).map(|record| record.status))
    }

    async fn is_tracking(&self, id: &JobId) -> ResqueResult<bool> {
        Ok(self.statuses.read().contains_key(id))
    }

    async fn stop(&self, id: &JobId) -> ResqueResult<()> {
        self.statuses.write().remove(id);
        Ok(())
    }
}

#[async_trait]
impl FailureRecorder for MemoryBackend {
    async fn record(&self, failure: FailureRecord) -> ResqueResult<()> {
        self.failures.write().push(failure);
        Ok(())
    }

    async fn count(&self) -> ResqueResult<usize> {
        Ok(self.failures.read().len())
    }

    async fn all(&self) -> ResqueResult<Vec<FailureRecord>> {
        Ok(self.failures.read().clone())
    }
}

#[async_trait]
impl StatsCounter for MemoryBackend {
    async fn incr(&self, stat: &str, by: u64) -> ResqueResult<()> {
        *self.stats.write().entry(stat.to_string()).or_insert(0) += by as i64;
        Ok(())
    }

    async fn decr(&self, stat: &str, by: u64) -> ResqueResult<()> {
        *self.stats.write().entry(stat.to_string()).or_insert(0) -= by as i64;
        Ok(())
    }

    async fn get(&self, stat: &str) -> ResqueResult<i64> {
        Ok(self.stats.read().get(stat).copied().unwrap_or(0))
    }

    async fn clear(&self, stat: &str) -> ResqueResult<()> {
        self.stats.write().remove(stat);
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
