#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;

use crate::{FailureRecord, JobId, JobStatus, ResqueResult};

/// List-like queue storage holding encoded payloads.
///
/// `pop` and `blocking_pop` must be atomic: an entry removed by one caller is
/// never handed to another.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append an entry to the tail of `queue`
    async fn push(&self, queue: &str, entry: String) -> ResqueResult<()>;

    /// Remove the head of `queue`, if any
    async fn pop(&self, queue: &str) -> ResqueResult<Option<String>>;

    /// Wait for the first entry across `queues`, checked in order.
    ///
    /// Returns the source queue with the entry, or `None` once `timeout`
    /// elapses. Without a timeout the call waits indefinitely.
    async fn blocking_pop(
        &self,
        queues: &[String],
        timeout: Option<Duration>,
    ) -> ResqueResult<Option<(String, String)>>;

    /// Number of entries waiting in `queue`
    async fn size(&self, queue: &str) -> ResqueResult<usize>;

    /// Names of all queues that have been pushed to
    async fn queues(&self) -> ResqueResult<Vec<String>>;
}

/// Keyed status storage for opted-in jobs
#[async_trait]
pub trait StatusTracker: Send + Sync {
    /// Start tracking `id` in the waiting state
    async fn init(&self, id: &JobId) -> ResqueResult<()>;

    /// Record a new status; ignored for jobs that are not tracked
    async fn update(&self, id: &JobId, status: JobStatus) -> ResqueResult<()>;

    /// Current status, `None` when not tracked
    async fn get(&self, id: &JobId) -> ResqueResult<Option<JobStatus>>;

    async fn is_tracking(&self, id: &JobId) -> ResqueResult<bool>;

    /// Stop tracking `id`
    async fn stop(&self, id: &JobId) -> ResqueResult<()>;
}

/// Persistent store of failed jobs
#[async_trait]
pub trait FailureRecorder: Send + Sync {
    async fn record(&self, failure: FailureRecord) -> ResqueResult<()>;

    async fn count(&self) -> ResqueResult<usize>;

    /// All recorded failures, oldest first
    async fn all(&self) -> ResqueResult<Vec<FailureRecord>>;
}

/// Named integer counters
#[async_trait]
pub trait StatsCounter: Send + Sync {
    async fn incr(&self, stat: &str, by: u64) -> ResqueResult<()>;

    async fn decr(&self, stat: &str, by: u64) -> ResqueResult<()>;

    async fn get(&self, stat: &str) -> ResqueResult<i64>;

    async fn clear(&self, stat: &str) -> ResqueResult<()>;
}
