use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ser::{SerError, SerKind, SerResult};

/// Renders a record as compact UTF-8 JSON.
pub(crate) fn encode<T: Serialize>(record: &T, kind: SerKind) -> SerResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|err| SerError::Json {
        kind,
        message: err.to_string(),
    })
}

/// Parses a record from JSON text.
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], kind: SerKind) -> SerResult<T> {
    serde_json::from_slice(bytes).map_err(|err| SerError::Json {
        kind,
        message: err.to_string(),
    })
}
