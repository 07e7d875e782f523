use serde_json::Value;
use tracing::warn;

use crate::{codec::PayloadCodec, Payload, ResqueResult};

/// JSON codec, compatible with Resque's payload encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode(&self, payload: &Payload) -> ResqueResult<String> {
        Ok(serde_json::to_string(payload)?)
    }

    fn decode(&self, raw: &str) -> Option<Payload> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding undecodable queue entry: {}", e);
                return None;
            }
        };

        if !value.is_object() {
            return None;
        }

        match serde_json::from_value(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("Discarding malformed payload: {}", e);
                None
            }
        }
    }

    fn codec_id(&self) -> &'static str {
        "json"
    }
}
