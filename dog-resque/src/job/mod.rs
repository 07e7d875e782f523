pub mod registry;
pub mod entity;
mod display;

pub use registry::{JobRegistry, JobFactory, RegistryJobFactory, HandlerConstructor};
pub use entity::Job;

use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    backend::StatusTracker, JobArgs, JobError, JobId, JobStatus, ResqueResult,
};

/// The object that performs the work of a job.
///
/// Handlers are built by a `JobFactory` with their arguments already bound.
/// `set_up` and `tear_down` are optional hooks around `perform`; the default
/// implementations do nothing. Returning `JobError::DontPerform` from any hook
/// skips the job without recording a failure.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Receive the handler's view of its job, once, right after construction
    fn bind(&mut self, _ctx: JobContext) {}

    async fn set_up(&mut self) -> Result<(), JobError> {
        Ok(())
    }

    async fn perform(&mut self) -> Result<(), JobError>;

    async fn tear_down(&mut self) -> Result<(), JobError> {
        Ok(())
    }
}

/// A handler type registered under a fixed class name
pub trait NamedJob: JobHandler + Sized + 'static {
    /// Class identifier carried in payloads
    const CLASS: &'static str;

    /// Build the handler from the payload arguments
    fn from_args(args: JobArgs, queue: &str) -> Result<Self, JobError>;
}

/// Deserialize job arguments into a typed struct
pub fn args_into<T: DeserializeOwned>(args: JobArgs) -> Result<T, JobError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| JobError::failed(format!("Invalid job arguments: {}", e)))
}

/// What a handler knows about the job it runs for
#[derive(Clone)]
pub struct JobContext {
    id: Option<JobId>,
    queue: String,
    class: String,
    args: JobArgs,
    status: Arc<dyn StatusTracker>,
}

impl JobContext {
    pub(crate) fn new(
        id: Option<JobId>,
        queue: String,
        class: String,
        args: JobArgs,
        status: Arc<dyn StatusTracker>,
    ) -> Self {
        Self { id, queue, class, args, status }
    }

    pub fn id(&self) -> Option<&JobId> {
        self.id.as_ref()
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn args(&self) -> &JobArgs {
        &self.args
    }

    /// Record a status for the job; a no-op when the job has no id
    pub async fn update_status(&self, status: JobStatus) -> ResqueResult<()> {
        match &self.id {
            Some(id) => self.status.update(id, status).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("id", &self.id)
            .field("queue", &self.queue)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
