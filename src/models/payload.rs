//! JSON payload encoding.
//!
//! Payloads are opaque to the graph: they are serialized on write and parsed
//! on read, nothing more. An empty payload (`null`, `{}` or `[]`) is always
//! stored as `{}` so a node never has a missing payload.

use crate::{Error, Result};
use serde_json::Value;

/// Stored form of an empty payload.
pub const EMPTY_PAYLOAD: &str = "{}";

/// Returns `true` for `null`, `{}` and `[]`.
#[must_use]
pub fn is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Serializes a payload for storage.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the value cannot be serialized.
pub fn encode(payload: &Value) -> Result<String> {
    if is_empty(payload) {
        return Ok(EMPTY_PAYLOAD.to_string());
    }
    serde_json::to_string(payload)
        .map_err(|e| Error::InvalidInput(format!("payload is not serializable: {e}")))
}

/// Parses a stored payload.
///
/// # Errors
///
/// Returns [`Error::Storage`] if the stored text is not valid JSON.
pub fn decode(stored: &str) -> Result<Value> {
    serde_json::from_str(stored).map_err(|e| Error::Storage {
        operation: "decode_payload".to_string(),
        cause: e.to_string(),
    })
}
