//! Session payload serialization
//!
//! The payload is stored in the `values` blob column as a JSON object. Keys
//! are strings, values are arbitrary JSON, so anything `serde` can represent
//! survives the trip.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::SessionError;

/// The key-value payload of a session
pub type Values = HashMap<String, Value>;

/// Serialize a payload for storage
pub fn encode_values(values: &Values) -> Result<Vec<u8>, SessionError> {
    Ok(serde_json::to_vec(values)?)
}

/// Deserialize a stored payload.
///
/// Either the whole object parses or an error is returned; a partial
/// payload is never produced.
pub fn decode_values(bytes: &[u8]) -> Result<Values, SessionError> {
    Ok(serde_json::from_slice(bytes)?)
}
