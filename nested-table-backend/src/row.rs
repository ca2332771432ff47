use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BackendError, Result};

/// A record shown in the table.
///
/// Rows must serialize to a JSON object: filtering, sorting and edit patches
/// all work on that projection, so the backend and the table core stay
/// entity-agnostic.
pub trait Row: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Unique key. An empty string means "not yet persisted".
    fn id(&self) -> &str;

    /// Assign the key chosen by the backend on create.
    fn set_id(&mut self, id: String);
}

/// JSON projection of a row.
pub fn to_value<T: Row>(row: &T) -> Result<Value> {
    let value = serde_json::to_value(row)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(BackendError::Serialization(format!(
            "row {} does not serialize to an object",
            row.id()
        )))
    }
}

/// Rebuild a row from its JSON projection.
pub fn from_value<T: Row>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Top-level field of a row projection.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.as_object().and_then(|map| map.get(name))
}
