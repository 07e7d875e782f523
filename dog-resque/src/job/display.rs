use std::fmt;

use serde_json::Value;

use super::Job;
use crate::JobArgs;

const ELLIPSIS: &str = "...";

/// Copy of `args` safe for logging: string values longer than `threshold`
/// characters are cut to `threshold` characters including the ellipsis,
/// except under keys starting with `meta_prefix`.
pub(crate) fn loggable_args(args: &JobArgs, meta_prefix: &str, threshold: usize) -> JobArgs {
    args.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if !key.starts_with(meta_prefix) => truncate(s, threshold),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn truncate(s: &str, threshold: usize) -> Value {
    if s.chars().count() <= threshold {
        return Value::String(s.to_string());
    }

    let keep = threshold.saturating_sub(ELLIPSIS.len());
    let mut short: String = s.chars().take(keep).collect();
    short.push_str(ELLIPSIS);
    Value::String(short)
}

/// `(Job{queue} | ID: id | class | [args])`, without the ID and args
/// segments when they are absent.
impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("Job{{{}}}", self.queue())];

        if let Some(id) = self.id() {
            parts.push(format!("ID: {}", id));
        }

        parts.push(self.class().to_string());

        if let Some(args) = self.payload().args.as_ref().filter(|args| !args.is_empty()) {
            let (meta_prefix, threshold) = self.display_config();
            let slot = [loggable_args(args, meta_prefix, threshold)];
            let json = serde_json::to_string(&slot).map_err(|_| fmt::Error)?;
            parts.push(json);
        }

        write!(f, "({})", parts.join(" | "))
    }
}
