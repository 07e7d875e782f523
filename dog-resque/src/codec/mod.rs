pub mod json;

use crate::{Payload, ResqueResult};

/// Converts payloads to and from the raw entries held by a queue store
pub trait PayloadCodec: Send + Sync {
    /// Encode a payload for storage
    fn encode(&self, payload: &Payload) -> ResqueResult<String>;

    /// Decode a stored entry.
    ///
    /// Entries that are not a payload mapping decode to `None`; reservation
    /// treats them like an empty queue.
    fn decode(&self, raw: &str) -> Option<Payload>;

    /// Get codec identifier
    fn codec_id(&self) -> &'static str;
}
