pub mod ids;
pub mod payload;
pub mod status;
pub mod events;
pub mod failure;

pub use ids::{JobId, IdGenerator, UuidIdGenerator};
pub use payload::{Payload, NewJob, JobArgs};
pub use status::{JobStatus, StatusRecord};
pub use events::{JobEvent, JobEventKind, EnqueueParams};
pub use failure::FailureRecord;
