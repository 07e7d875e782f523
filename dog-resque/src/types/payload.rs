use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::JobId;
use crate::{ResqueError, ResqueResult};

/// Named job arguments
pub type JobArgs = Map<String, Value>;

/// Job payload - immutable description of a queued unit of work.
///
/// Wire shape: `{"class": .., "args": [{..} | null], "id": .., "queue_time": ..}`.
/// The `args` slot is always a single-element sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Handler identifier used for dispatch
    pub class: String,

    /// The single argument mapping, if any
    #[serde(default, with = "single_slot")]
    pub args: Option<JobArgs>,

    /// Globally unique job id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,

    /// Enqueue time in fractional unix seconds (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<f64>,
}

impl Payload {
    /// Create a payload stamped with the current time
    pub fn new(class: impl Into<String>, args: Option<JobArgs>, id: JobId) -> Self {
        Self {
            class: class.into(),
            args,
            id: Some(id),
            queue_time: Some(now_seconds()),
        }
    }

    /// The argument mapping, or an empty one when absent
    pub fn arguments(&self) -> JobArgs {
        self.args.clone().unwrap_or_default()
    }

    /// The job id, when it is present and non-empty
    pub fn job_id(&self) -> Option<&JobId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }
}

fn now_seconds() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Request to create a job
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    /// Destination queue
    pub queue: String,

    /// Handler identifier
    pub class: String,

    /// Arguments; must be a JSON object or null
    pub args: Option<Value>,

    /// Whether to track status for the job
    pub monitor: bool,

    /// Explicit id, generated when absent
    pub id: Option<JobId>,
}

impl NewJob {
    pub fn new(queue: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            class: class.into(),
            args: None,
            monitor: false,
            id: None,
        }
    }

    /// Set the arguments
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Enable or disable status tracking
    pub fn with_monitor(mut self, monitor: bool) -> Self {
        self.monitor = monitor;
        self
    }

    /// Use a caller supplied id
    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Validate the argument shape, returning the mapping to store
    pub fn validated_args(&self) -> ResqueResult<Option<JobArgs>> {
        match &self.args {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(other) => Err(ResqueError::invalid_argument(format!(
                "Supplied args must be a mapping, got {}",
                value_kind(other)
            ))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serde adapter keeping `args` as a one-element sequence on the wire
mod single_slot {
    use serde::de::Deserializer;
    use serde::ser::{SerializeSeq, Serializer};
    use serde::Deserialize;

    use super::JobArgs;

    pub fn serialize<S: Serializer>(args: &Option<JobArgs>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(args)?;
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<JobArgs>, D::Error> {
        let slots: Option<Vec<Option<JobArgs>>> = Option::deserialize(deserializer)?;
        Ok(slots.and_then(|slots| slots.into_iter().next().flatten()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_are_wrapped_in_a_single_slot() {
        let args = json!({"to": "a@example.com"}).as_object().cloned();
        let payload = Payload::new("SendWelcome", args, JobId::from("abc123"));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["args"], json!([{"to": "a@example.com"}]));
        assert_eq!(value["id"], json!("abc123"));
        assert!(value["queue_time"].is_f64());

        let empty = Payload::new("Noop", None, JobId::from("x"));
        assert_eq!(serde_json::to_value(&empty).unwrap()["args"], json!([null]));
    }

    #[test]
    fn missing_fields_decode_as_absent() {
        let payload: Payload = serde_json::from_str(r#"{"class":"Noop"}"#).unwrap();
        assert_eq!(payload.args, None);
        assert_eq!(payload.job_id(), None);
        assert!(payload.arguments().is_empty());

        let payload: Payload = serde_json::from_str(r#"{"class":"Noop","args":[],"id":""}"#).unwrap();
        assert_eq!(payload.args, None);
        assert_eq!(payload.job_id(), None);
    }

    #[test]
    fn only_mappings_or_null_are_valid_args() {
        assert_eq!(NewJob::new("q", "C").validated_args().unwrap(), None);
        assert_eq!(NewJob::new("q", "C").with_args(Value::Null).validated_args().unwrap(), None);
        assert!(NewJob::new("q", "C").with_args(json!({"a": 1})).validated_args().unwrap().is_some());

        for bad in [json!("text"), json!(3), json!([1, 2]), json!(true)] {
            let err = NewJob::new("q", "C").with_args(bad).validated_args().unwrap_err();
            assert!(matches!(err, ResqueError::InvalidArgument(_)));
        }
    }
}
