//! Core error types for leitner-core.
//!
//! Every public operation returns [`CoreError`]. Store failures are carried
//! through unchanged in [`CoreError::Store`]; nothing in this crate retries.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for leitner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Box number outside 1..=5 reached the interval table.
    #[error("Invalid box number {0}: must be between 1 and 5")]
    InvalidBox(u8),

    /// A review or reset was requested for an item that was never scheduled.
    #[error("No schedule record found for item '{item_id}'")]
    RecordNotFound { item_id: String },

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Settings-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn not_found(item_id: &str) -> Self {
        CoreError::RecordNotFound {
            item_id: item_id.to_string(),
        }
    }
}

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A writer panicked while holding the in-memory store lock
    #[error("Store lock poisoned")]
    Poisoned,

    /// A stored value could not be decoded
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

/// Settings-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load settings
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save settings
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid settings value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown settings key
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required identifier was empty
    #[error("Empty identifier for '{0}'")]
    EmptyId(&'static str),

    /// Entity already registered
    #[error("{kind} '{id}' is already registered")]
    Duplicate { kind: &'static str, id: String },

    /// Referenced entity does not exist
    #[error("Unknown {kind} '{id}'")]
    UnknownReference { kind: &'static str, id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => match e.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    StoreError::Locked
                }
                _ => StoreError::QueryFailed(err.to_string()),
            },
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_box_message_names_the_box() {
        let err = CoreError::InvalidBox(6);
        assert_eq!(err.to_string(), "Invalid box number 6: must be between 1 and 5");
    }

    #[test]
    fn record_not_found_carries_item_id() {
        let err = CoreError::not_found("card-7");
        match err {
            CoreError::RecordNotFound { ref item_id } => assert_eq!(item_id, "card-7"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn busy_sqlite_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(StoreError::from(err), StoreError::Locked));
    }

    #[test]
    fn other_sqlite_errors_map_to_query_failed() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(StoreError::from(err), StoreError::QueryFailed(_)));
    }
}
