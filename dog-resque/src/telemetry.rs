//! Basic log output for binaries embedding the client.
//!
//! Filtering follows `RUST_LOG`, falling back to `dog_resque=info`.

use tracing_subscriber::EnvFilter;

use crate::{ResqueError, ResqueResult};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dog_resque=info"))
}

/// Install a human readable subscriber
pub fn init_tracing() -> ResqueResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .try_init()
        .map_err(|e| ResqueError::Config(format!("Failed to install subscriber: {}", e)))
}

/// Install a JSON subscriber, one object per line
pub fn init_json_tracing() -> ResqueResult<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter())
        .try_init()
        .map_err(|e| ResqueError::Config(format!("Failed to install subscriber: {}", e)))
}
