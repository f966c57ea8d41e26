//! Core error types for humane-core.
//!
//! This module defines the error hierarchy using thiserror. The status
//! engine and aggregation layer never return these; they degrade to
//! defaults instead. Stores, configuration and the sign-in protocol do.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for humane-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed habit or entry input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation on an id the store does not know
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Persistence failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Failure while sequencing an abandon/merge during sign-in
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// Login call failure
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn habit_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind: "Habit",
            id: id.into(),
        }
    }

    pub fn entry_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind: "Entry",
            id: id.into(),
        }
    }
}

/// Persistence-layer errors.
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

    /// Database is locked by another writer
    #[error("Database is locked")]
    Locked,

    /// Stored row could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    /// Backend unavailable (used by non-SQLite stores)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No usable data directory
    #[error("Cannot determine data directory: {0}")]
    NoDataDir(String),
}

/// Authentication errors raised by an [`Authenticator`](crate::reconcile::Authenticator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login was attempted and rejected
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Remote endpoint could not be reached
    #[error("Sync endpoint unreachable: {0}")]
    Unreachable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required string field is blank
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Weekly target outside 1..=7
    #[error("target_per_week must be between 1 and 7, got {0}")]
    TargetOutOfRange(i64),

    /// Unknown category name
    #[error("Unknown category '{0}' (expected one of: mobility, connection, balance, joy, strength)")]
    UnknownCategory(String),

    /// Entry value outside the cycle domain
    #[error("Entry value {0} is not storable (must be > 0 and <= 5)")]
    InvalidEntryValue(f64),

    /// Date string could not be parsed
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(StoreError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = CoreError::habit_not_found("h-1");
        assert_eq!(err.to_string(), "Habit not found: h-1");
        let err = CoreError::entry_not_found("e-9");
        assert_eq!(err.to_string(), "Entry not found: e-9");
    }

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::Empty("user_id").into();
        assert!(matches!(err, CoreError::Validation(ValidationError::Empty("user_id"))));
        assert_eq!(err.to_string(), "Validation error: 'user_id' must not be empty");
    }

    #[test]
    fn query_errors_map_to_query_failed() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StoreError::QueryFailed(_)));
    }
}
