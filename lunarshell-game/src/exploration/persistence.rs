//! Storage shapes for the exploration log and run state.
use crate::entry::LogEntry;
use crate::error::PersistenceError;
use crate::ports::Storage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted history: `{ "entries": [...] }`, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBlob {
    #[serde(default)]
    pub entries: Vec<LogEntry>,
}

/// Persisted run state: `{ "isExploring", "startedAtEpochMs", "elapsedMs" }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStateBlob {
    #[serde(default)]
    pub is_exploring: bool,
    #[serde(default)]
    pub started_at_epoch_ms: u64,
    /// Active time accrued before the snapshot was taken.
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Decode a stored blob, falling back to the default shape when it is absent or malformed.
pub fn decode<T: DeserializeOwned + Default>(key: &str, raw: Option<Value>) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    serde_json::from_value(raw).unwrap_or_else(|err| {
        log::warn!("discarding malformed `{key}` blob: {err}");
        T::default()
    })
}

pub(crate) fn load<S: Storage, T: DeserializeOwned + Default>(storage: &S, key: &str) -> T {
    match storage.load(key) {
        Ok(raw) => decode(key, raw),
        Err(err) => {
            log::warn!("failed to load `{key}`: {err}");
            T::default()
        }
    }
}

pub(crate) fn save<S: Storage, T: Serialize>(
    storage: &S,
    key: &'static str,
    value: &T,
) -> Result<(), PersistenceError> {
    let blob =
        serde_json::to_value(value).map_err(|source| PersistenceError::Encode { key, source })?;
    storage
        .save(key, &blob)
        .map_err(|err| PersistenceError::Storage {
            key,
            message: err.to_string(),
        })
}

pub(crate) fn remove<S: Storage>(storage: &S, key: &'static str) -> Result<(), PersistenceError> {
    storage
        .remove(key)
        .map_err(|err| PersistenceError::Storage {
            key,
            message: err.to_string(),
        })
}
