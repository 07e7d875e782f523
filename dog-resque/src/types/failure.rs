use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Payload;
use crate::ResqueError;

/// Failure details persisted by a `FailureRecorder`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub failed_at: DateTime<Utc>,
    pub payload: Payload,

    /// Error class name
    pub exception: String,

    /// Error message
    pub error: String,

    /// Worker that reserved the job, if known
    pub worker: Option<String>,

    pub queue: String,
}

impl FailureRecord {
    pub fn new(payload: &Payload, error: &ResqueError, worker: Option<&str>, queue: &str) -> Self {
        Self {
            failed_at: Utc::now(),
            payload: payload.clone(),
            exception: error.kind().to_string(),
            error: error.to_string(),
            worker: worker.map(str::to_string),
            queue: queue.to_string(),
        }
    }
}
