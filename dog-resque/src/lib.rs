//! # dog-resque: Resque-compatible job lifecycle
//!
//! Client side of a Resque-style queue: jobs are created as JSON payloads on
//! named queues, reserved by workers, performed through a handler resolved
//! by class name, and tracked or failed into shared stores.
//!
//! ## Features
//!
//! - **Wire compatible**: `{"class", "args": [{..}], "id", "queue_time"}` payloads
//! - **Hooks**: `BeforeEnqueue`/`AfterEnqueue`/`BeforePerform`/`AfterPerform`/`OnFailure`
//!   listeners, with `DontCreate` and `DontPerform` cancellation
//! - **Pluggable stores**: queue, status, failure and stats collaborators behind traits
//! - **Backends**: in-memory (default) and Redis (`redis` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_resque::prelude::*;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize)]
//! struct SendWelcome {
//!     to: String,
//! }
//!
//! #[async_trait]
//! impl JobHandler for SendWelcome {
//!     async fn perform(&mut self) -> Result<(), JobError> {
//!         println!("welcome, {}", self.to);
//!         Ok(())
//!     }
//! }
//!
//! impl NamedJob for SendWelcome {
//!     const CLASS: &'static str = "SendWelcome";
//!
//!     fn from_args(args: JobArgs, _queue: &str) -> Result<Self, JobError> {
//!         args_into(args)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let client = QueueClient::new(MemoryBackend::new());
//! client.registry().register::<SendWelcome>()?;
//!
//! let id = client
//!     .create(NewJob::new("emails", "SendWelcome").with_args(json!({"to": "a@example.com"})))
//!     .await?;
//!
//! let mut job = client.reserve("emails").await?.expect("job was queued");
//! assert_eq!(job.id(), Some(&id));
//!
//! if let Err(e) = job.perform().await {
//!     job.fail(&e).await?;
//! }
//! # Ok::<(), ResqueError>(())
//! # }).unwrap();
//! ```

pub mod error;
pub mod config;
pub mod types;
pub mod codec;
pub mod hooks;
pub mod job;
pub mod backend;
pub mod client;

#[cfg(feature = "tracing-basic")]
pub mod telemetry;

pub use client::QueueClient;
pub use config::ResqueConfig;
pub use error::{ResqueError, ResqueResult, JobError};
pub use types::{
    JobId, IdGenerator, UuidIdGenerator, Payload, NewJob, JobArgs, JobStatus, StatusRecord,
    JobEvent, JobEventKind, EnqueueParams, FailureRecord,
};
pub use codec::PayloadCodec;
pub use codec::json::JsonCodec;
pub use hooks::{EventBus, ListenerId};
pub use job::{
    Job, JobHandler, NamedJob, JobContext, JobFactory, JobRegistry, RegistryJobFactory, args_into,
};
pub use backend::{QueueStore, StatusTracker, FailureRecorder, StatsCounter};

// Backend implementations
#[cfg(feature = "memory")]
pub use backend::memory::MemoryBackend;

#[cfg(feature = "redis")]
pub use backend::redis::{RedisBackend, RedisKeys};

/// Everything needed to define handlers and run jobs
pub mod prelude {
    pub use crate::{
        QueueClient, ResqueConfig, Job, NewJob, JobId, JobArgs, JobStatus,
    };

    pub use crate::{
        JobHandler, NamedJob, JobContext, JobError, ResqueError, ResqueResult, args_into,
    };

    pub use crate::{EventBus, JobEvent, JobEventKind};

    #[cfg(feature = "memory")]
    pub use crate::MemoryBackend;

    pub use async_trait::async_trait;
}
