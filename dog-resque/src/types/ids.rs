use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new unique job ID (32 lowercase hex chars)
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Source of job ids for newly created jobs.
///
/// Implementations must produce collision-resistant strings. Any
/// `Fn() -> JobId` closure works as a generator.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> JobId;
}

/// Default generator backed by random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> JobId {
        JobId::new()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> JobId + Send + Sync,
{
    fn generate(&self) -> JobId {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_hex_and_distinct() {
        let ids: HashSet<JobId> = (0..256).map(|_| UuidIdGenerator.generate()).collect();
        assert_eq!(ids.len(), 256);

        let id = JobId::new();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn closures_are_generators() {
        let fixed = || JobId::from("abc123");
        assert_eq!(fixed.generate(), JobId::from("abc123"));
    }
}
