use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracked job status, stored as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JobStatus {
    /// Queued, not yet picked up
    Waiting = 1,

    /// Being performed by a worker
    Running = 2,

    Failed = 3,

    Complete = 4,
}

impl JobStatus {
    /// Get all statuses in code order
    pub fn all() -> &'static [JobStatus] {
        &[Self::Waiting, Self::Running, Self::Failed, Self::Complete]
    }

    /// Get the numeric code
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create from numeric code
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Waiting),
            2 => Some(Self::Running),
            3 => Some(Self::Failed),
            4 => Some(Self::Complete),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Complete => "complete",
        }
    }

    /// Failed and Complete are final
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Complete)
    }
}

impl From<JobStatus> for u8 {
    fn from(status: JobStatus) -> Self {
        status.as_u8()
    }
}

impl TryFrom<u8> for JobStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| format!("Invalid job status code: {}", value))
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "running" => Ok(Self::Running),
            "failed" => Ok(Self::Failed),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// Persisted status entry; its presence means the job is tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: JobStatus,

    /// Last update time (unix seconds)
    pub updated: i64,

    /// When tracking began (unix seconds)
    pub started: i64,
}

impl StatusRecord {
    /// Fresh record in the waiting state
    pub fn waiting(now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Waiting,
            updated: now.timestamp(),
            started: now.timestamp(),
        }
    }

    /// Move to a new status, keeping the start time
    pub fn transition(&mut self, status: JobStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated = now.timestamp();
    }
}
