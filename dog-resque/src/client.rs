use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::{
    ResqueResult, ResqueError, ResqueConfig, JobId, NewJob, Payload, JobEvent, EnqueueParams,
    IdGenerator, UuidIdGenerator,
    backend::{QueueStore, StatusTracker, FailureRecorder, StatsCounter},
    codec::{PayloadCodec, json::JsonCodec},
    hooks::EventBus,
    job::{Job, JobFactory, JobRegistry, RegistryJobFactory},
};

/// Entry point for creating and reserving jobs.
///
/// Holds every collaborator behind an `Arc`; clones are cheap and share them.
/// Reserved jobs keep a clone so `perform`/`fail` reach the same stores.
#[derive(Clone)]
pub struct QueueClient {
    store: Arc<dyn QueueStore>,
    status: Arc<dyn StatusTracker>,
    failures: Arc<dyn FailureRecorder>,
    stats: Arc<dyn StatsCounter>,
    events: Arc<EventBus>,
    registry: Arc<JobRegistry>,
    job_factory: Option<Arc<dyn JobFactory>>,
    id_generator: Arc<dyn IdGenerator>,
    codec: Arc<dyn PayloadCodec>,
    config: ResqueConfig,
}

impl QueueClient {
    /// Create a client backed entirely by one backend
    pub fn new<B>(backend: B) -> Self
    where
        B: QueueStore + StatusTracker + FailureRecorder + StatsCounter + 'static,
    {
        let backend = Arc::new(backend);
        Self::from_parts(backend.clone(), backend.clone(), backend.clone(), backend)
    }

    /// Create a client from separate collaborators
    pub fn from_parts(
        store: Arc<dyn QueueStore>,
        status: Arc<dyn StatusTracker>,
        failures: Arc<dyn FailureRecorder>,
        stats: Arc<dyn StatsCounter>,
    ) -> Self {
        Self {
            store,
            status,
            failures,
            stats,
            events: Arc::new(EventBus::new()),
            registry: Arc::new(JobRegistry::new()),
            job_factory: None,
            id_generator: Arc::new(UuidIdGenerator),
            codec: Arc::new(JsonCodec),
            config: ResqueConfig::default(),
        }
    }

    /// Use `config`, rejecting it when invalid
    pub fn with_config(mut self, config: ResqueConfig) -> ResqueResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Share an event bus with other clients
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_registry(mut self, registry: Arc<JobRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve handlers with `factory` instead of the registry
    pub fn with_job_factory(mut self, factory: Arc<dyn JobFactory>) -> Self {
        self.job_factory = Some(factory);
        self
    }

    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Create a job: push its payload onto `job.queue` and, when monitored,
    /// start tracking its status. Returns the job id.
    ///
    /// Fails with `InvalidArgument`, before touching the store, if the
    /// arguments are not a mapping.
    #[instrument(skip(self, job), fields(queue = %job.queue, class = %job.class))]
    pub async fn create(&self, job: NewJob) -> ResqueResult<JobId> {
        let args = job.validated_args()?;
        let id = job.id.clone().unwrap_or_else(|| self.id_generator.generate());

        let payload = Payload::new(job.class, args, id.clone());
        let entry = self.codec.encode(&payload)?;
        self.store.push(&job.queue, entry).await?;

        if job.monitor {
            self.status.init(&id).await?;
        }

        info!("Created job {} on queue {}", id, job.queue);
        Ok(id)
    }

    /// Create a job wrapped in the enqueue events.
    ///
    /// Returns `Ok(None)` when a `BeforeEnqueue` listener cancels with
    /// `DontCreate`; nothing is pushed in that case.
    pub async fn enqueue(&self, job: NewJob) -> ResqueResult<Option<JobId>> {
        job.validated_args()?;
        let id = job.id.clone().unwrap_or_else(|| self.id_generator.generate());

        let params = EnqueueParams {
            class: &job.class,
            args: job.args.as_ref(),
            queue: &job.queue,
            id: &id,
        };
        match self.events.trigger(&JobEvent::BeforeEnqueue(params)) {
            Ok(()) => {}
            Err(ResqueError::DontCreate) => {
                info!("Enqueue of {} on {} cancelled", job.class, job.queue);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let id = self.create(job.clone().with_id(id)).await?;

        let params = EnqueueParams {
            class: &job.class,
            args: job.args.as_ref(),
            queue: &job.queue,
            id: &id,
        };
        self.events.trigger(&JobEvent::AfterEnqueue(params))?;
        Ok(Some(id))
    }

    /// Pop the next job from `queue` without waiting.
    ///
    /// Returns `None` for an empty queue or an entry that is not a payload.
    pub async fn reserve(&self, queue: &str) -> ResqueResult<Option<Job>> {
        let Some(entry) = self.store.pop(queue).await? else {
            return Ok(None);
        };

        Ok(self.codec.decode(&entry).map(|payload| {
            debug!("Reserved {:?} from {}", payload.id, queue);
            Job::new(queue, payload, self.clone())
        }))
    }

    /// Wait for the next job across `queues`, checked in order.
    ///
    /// Without a timeout the configured default applies; when neither is set
    /// the call waits indefinitely. Returns `None` on timeout.
    #[instrument(skip(self))]
    pub async fn reserve_blocking(
        &self,
        queues: &[&str],
        timeout: Option<Duration>,
    ) -> ResqueResult<Option<Job>> {
        let names: Vec<String> = queues.iter().map(|q| q.to_string()).collect();
        let timeout = timeout.or(self.config.blocking_timeout);

        let Some((queue, entry)) = self.store.blocking_pop(&names, timeout).await? else {
            return Ok(None);
        };

        Ok(self.codec.decode(&entry).map(|payload| {
            debug!("Reserved {:?} from {}", payload.id, queue);
            Job::new(queue, payload, self.clone())
        }))
    }

    /// Number of entries waiting in `queue`
    pub async fn size(&self, queue: &str) -> ResqueResult<usize> {
        self.store.size(queue).await
    }

    /// Known queue names
    pub async fn queues(&self) -> ResqueResult<Vec<String>> {
        self.store.queues().await
    }

    pub(crate) fn default_job_factory(&self) -> Arc<dyn JobFactory> {
        match &self.job_factory {
            Some(factory) => factory.clone(),
            None => Arc::new(RegistryJobFactory::new(self.registry.clone())),
        }
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub fn status_tracker(&self) -> &Arc<dyn StatusTracker> {
        &self.status
    }

    pub fn failures(&self) -> &Arc<dyn FailureRecorder> {
        &self.failures
    }

    pub fn stats(&self) -> &Arc<dyn StatsCounter> {
        &self.stats
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Get configuration
    pub fn config(&self) -> &ResqueConfig {
        &self.config
    }
}
