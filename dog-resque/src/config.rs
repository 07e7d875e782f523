//! Client configuration.
//!
//! Defaults match a local Resque deployment. Values can be layered from the
//! environment with the DogRS convention, `PREFIX__KEY`:
//!
//! ```bash
//! export RESQUE__NAMESPACE=billing
//! export RESQUE__REDIS_URL=redis://cache:6379
//! export RESQUE__BLOCKING_TIMEOUT_SECS=5
//! ```

use std::time::Duration;

use crate::{ResqueError, ResqueResult};

/// Arguments longer than this are shortened in log output
pub const DEFAULT_TRUNCATE_THRESHOLD: usize = 512;

/// Argument keys starting with this are never shortened
pub const DEFAULT_META_PREFIX: &str = "__";

#[derive(Debug, Clone, PartialEq)]
pub struct ResqueConfig {
    /// Key namespace in the store
    pub namespace: String,

    pub redis_url: String,

    /// Default wait for `reserve_blocking`; `None` waits forever
    pub blocking_timeout: Option<Duration>,

    /// Marks meta-arguments that are logged verbatim
    pub meta_prefix: String,

    /// Maximum logged length of a string argument, in characters
    pub truncate_threshold: usize,
}

impl Default for ResqueConfig {
    fn default() -> Self {
        Self {
            namespace: "resque".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            blocking_timeout: None,
            meta_prefix: DEFAULT_META_PREFIX.to_string(),
            truncate_threshold: DEFAULT_TRUNCATE_THRESHOLD,
        }
    }
}

impl ResqueConfig {
    /// Defaults overridden by `PREFIX__*` environment variables
    pub fn from_env(prefix: &str) -> ResqueResult<Self> {
        Self::default().with_vars(prefix, std::env::vars())
    }

    /// Apply overrides from key/value pairs; unknown keys are ignored
    pub fn with_vars<I>(mut self, prefix: &str, vars: I) -> ResqueResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}__", prefix);

        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(&prefix) else {
                continue;
            };

            match stripped.to_lowercase().as_str() {
                "namespace" => self.namespace = value,
                "redis_url" => self.redis_url = value,
                "blocking_timeout_secs" => {
                    let secs: u64 = parse(&key, &value)?;
                    self.blocking_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                }
                "meta_prefix" => self.meta_prefix = value,
                "truncate_threshold" => self.truncate_threshold = parse(&key, &value)?,
                _ => {}
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the client cannot honor
    pub fn validate(&self) -> ResqueResult<()> {
        if self.truncate_threshold < 4 {
            return Err(ResqueError::Config(format!(
                "truncate_threshold must be at least 4, got {}",
                self.truncate_threshold
            )));
        }
        Ok(())
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_blocking_timeout(mut self, timeout: Duration) -> Self {
        self.blocking_timeout = Some(timeout);
        self
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ResqueResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ResqueError::Config(format!("{} has an invalid value: {:?}", key, value)))
}
