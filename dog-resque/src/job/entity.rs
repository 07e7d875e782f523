use std::fmt;
use std::sync::Arc;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    QueueClient, ResqueResult, ResqueError, JobId, JobArgs, JobStatus, JobEvent,
    NewJob, Payload, FailureRecord,
};
use super::{JobContext, JobFactory, JobHandler};

/// Stat incremented for every failed job
pub const FAILED_STAT: &str = "failed";

/// A reserved job, ready to perform.
///
/// Produced by `QueueClient::reserve`/`reserve_blocking` and dropped once
/// `perform` or `fail` returns; a job is never reused across queue cycles.
pub struct Job {
    queue: String,
    payload: Payload,
    worker: Option<String>,
    instance: Option<Box<dyn JobHandler>>,
    job_factory: OnceCell<Arc<dyn JobFactory>>,
    client: QueueClient,
}

impl Job {
    /// Wrap a payload reserved from `queue`
    pub fn new(queue: impl Into<String>, payload: Payload, client: QueueClient) -> Self {
        Self {
            queue: queue.into(),
            payload,
            worker: None,
            instance: None,
            job_factory: OnceCell::new(),
            client,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn id(&self) -> Option<&JobId> {
        self.payload.job_id()
    }

    pub fn class(&self) -> &str {
        &self.payload.class
    }

    /// Identity of the reserving worker, used for failure reporting
    pub fn worker(&self) -> Option<&str> {
        self.worker.as_deref()
    }

    pub fn set_worker(&mut self, worker: impl Into<String>) {
        self.worker = Some(worker.into());
    }

    /// The job's argument mapping, empty when none were given
    pub fn arguments(&self) -> JobArgs {
        self.payload.arguments()
    }

    /// Replace the factory used to build the handler.
    ///
    /// Only affects a handler that has not been built yet.
    pub fn set_job_factory(&mut self, factory: Arc<dyn JobFactory>) {
        self.job_factory = OnceCell::with_value(factory);
    }

    /// The injected factory, or the client's default installed on first use
    pub fn job_factory(&self) -> &Arc<dyn JobFactory> {
        self.job_factory.get_or_init(|| self.client.default_job_factory())
    }

    /// Handler's view of this job
    pub fn context(&self) -> JobContext {
        JobContext::new(
            self.payload.job_id().cloned(),
            self.queue.clone(),
            self.payload.class.clone(),
            self.arguments(),
            self.client.status_tracker().clone(),
        )
    }

    /// Resolve the handler, building and binding it on first call
    pub fn instance(&mut self) -> ResqueResult<&mut Box<dyn JobHandler>> {
        let handler = match self.instance.take() {
            Some(handler) => handler,
            None => {
                let factory = self.job_factory().clone();
                let mut handler = factory.create(&self.payload.class, self.arguments(), &self.queue)?;
                handler.bind(self.context());
                debug!("Built handler for {}", self.payload.class);
                handler
            }
        };

        Ok(self.instance.insert(handler))
    }

    /// Run the job.
    ///
    /// Returns `Ok(false)` when a `BeforePerform` listener or a handler hook
    /// declines with `DontPerform`. Other errors are returned untouched; the
    /// caller is expected to pass them to `fail`.
    #[instrument(skip(self), fields(job_id = ?self.payload.id, queue = %self.queue))]
    pub async fn perform(&mut self) -> ResqueResult<bool> {
        match self.run().await {
            Ok(()) => Ok(true),
            Err(ResqueError::DontPerform) => {
                info!("Job skipped by DontPerform");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn run(&mut self) -> ResqueResult<()> {
        let events = self.client.events().clone();
        events.trigger(&JobEvent::BeforePerform(self))?;

        let handler = self.instance()?;
        handler.set_up().await?;
        handler.perform().await?;
        handler.tear_down().await?;

        events.trigger(&JobEvent::AfterPerform(self))?;
        Ok(())
    }

    /// Record a failure: fires `OnFailure`, marks the status failed, stores a
    /// failure record and bumps the global and per-worker failure counters.
    #[instrument(skip(self, error), fields(job_id = ?self.payload.id, queue = %self.queue))]
    pub async fn fail(&self, error: &ResqueError) -> ResqueResult<()> {
        warn!("Job failed: {}", error);
        self.client.events().trigger(&JobEvent::OnFailure { job: self, error })?;
        self.update_status(JobStatus::Failed).await?;

        let record = FailureRecord::new(&self.payload, error, self.worker(), &self.queue);
        self.client.failures().record(record).await?;

        let stats = self.client.stats();
        stats.incr(FAILED_STAT, 1).await?;
        stats
            .incr(&format!("{}:{}", FAILED_STAT, self.worker().unwrap_or_default()), 1)
            .await?;
        Ok(())
    }

    /// Push a copy of this job back onto its queue under a new id.
    ///
    /// Status tracking carries over when the original job is tracked.
    pub async fn recreate(&self) -> ResqueResult<JobId> {
        let monitor = match self.payload.job_id() {
            Some(id) => self.client.status_tracker().is_tracking(id).await?,
            None => false,
        };

        let mut job = NewJob::new(self.queue.clone(), self.payload.class.clone()).with_monitor(monitor);
        job.args = self.payload.args.clone().map(Value::Object);
        self.client.create(job).await
    }

    /// Record `status`; a no-op for jobs without an id
    pub async fn update_status(&self, status: JobStatus) -> ResqueResult<()> {
        match self.payload.job_id() {
            Some(id) => self.client.status_tracker().update(id, status).await,
            None => Ok(()),
        }
    }

    /// Current tracked status, `None` when the job is not tracked
    pub async fn status(&self) -> ResqueResult<Option<JobStatus>> {
        let id = self.payload.job_id().ok_or(ResqueError::MissingJobId)?;
        self.client.status_tracker().get(id).await
    }

    pub(crate) fn display_config(&self) -> (&str, usize) {
        let config = self.client.config();
        (config.meta_prefix.as_str(), config.truncate_threshold)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("queue", &self.queue)
            .field("payload", &self.payload)
            .field("worker", &self.worker)
            .field("instance", &self.instance.is_some())
            .finish_non_exhaustive()
    }
}
