//! Error types surfaced by the exploration core.
use crate::entry::EntryId;
use thiserror::Error;

/// Failures when acting on a choice-bearing entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("no log entry with id `{0}`")]
    EntryNotFound(EntryId),
    #[error("entry `{entry_id}` has no option `{option_id}`")]
    OptionNotFound { entry_id: EntryId, option_id: String },
    #[error("entry `{0}` has already been resolved")]
    AlreadyResolved(EntryId),
}

/// Failures when running the combat follow-up for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatFlowError {
    #[error("no log entry with id `{0}`")]
    EntryNotFound(EntryId),
    #[error("entry `{0}` carries no encounter context")]
    NoEncounterContext(EntryId),
    #[error("entry `{0}` was not resolved with an option that starts a fight")]
    NotTriggered(EntryId),
    #[error("combat for entry `{0}` has already been resolved")]
    AlreadyFought(EntryId),
}

/// Failures writing or reading a persisted blob.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage rejected `{key}`: {message}")]
    Storage { key: &'static str, message: String },
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid exploration settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("{field} must be within {min}..={max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must not exceed {other} ({value} > {limit})")]
    OrderViolation {
        field: &'static str,
        other: &'static str,
        value: f64,
        limit: f64,
    },
    #[error("failed to parse settings: {0}")]
    Parse(String),
}
