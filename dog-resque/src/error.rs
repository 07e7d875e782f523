use thiserror::Error;

/// Result type for resque operations
pub type ResqueResult<T> = Result<T, ResqueError>;

/// Errors raised by the job lifecycle and its collaborators
#[derive(Error, Debug, Clone)]
pub enum ResqueError {
    /// Bad input to job creation; do not retry without fixing it
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Raised by a `BeforePerform` listener (or the handler) to skip the job.
    /// Not a failure: `Job::perform` turns it into `Ok(false)`.
    #[error("Job declined to perform")]
    DontPerform,

    /// Raised by a `BeforeEnqueue` listener to abort an enqueue
    #[error("Job creation was cancelled")]
    DontCreate,

    #[error("Could not find job class {0}")]
    HandlerNotFound(String),

    #[error("Job handler failed: {0}")]
    HandlerFailed(String),

    #[error("Job has no id")]
    MissingJobId,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResqueError {
    /// Stable name of the error class, recorded as the failure "exception"
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::DontPerform => "DontPerform",
            Self::DontCreate => "DontCreate",
            Self::HandlerNotFound(_) => "HandlerResolutionFailure",
            Self::HandlerFailed(_) => "HandlerExecutionFailure",
            Self::MissingJobId => "MissingJobId",
            Self::Store(_) => "StoreError",
            Self::Serialization(_) => "SerializationError",
            Self::Config(_) => "ConfigError",
        }
    }

    /// Check if this is the perform cancellation signal
    pub fn is_dont_perform(&self) -> bool {
        matches!(self, Self::DontPerform)
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Outcome reported by a job handler's hooks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Skip the job without recording a failure
    #[error("Job declined to perform")]
    DontPerform,

    /// The work itself failed
    #[error("{0}")]
    Failed(String),
}

impl JobError {
    /// Create a failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<JobError> for ResqueError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::DontPerform => Self::DontPerform,
            JobError::Failed(msg) => Self::HandlerFailed(msg),
        }
    }
}

impl From<serde_json::Error> for ResqueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for ResqueError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_error_maps_onto_resque_error() {
        assert!(ResqueError::from(JobError::DontPerform).is_dont_perform());

        let err = ResqueError::from(JobError::failed("smtp down"));
        assert_eq!(err.kind(), "HandlerExecutionFailure");
        assert_eq!(err.to_string(), "Job handler failed: smtp down");
    }

    #[test]
    fn serde_errors_become_serialization_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        assert!(matches!(ResqueError::from(err), ResqueError::Serialization(_)));
    }
}
