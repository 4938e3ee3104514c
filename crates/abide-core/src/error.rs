//! Core error types for abide-core.
//!
//! Everything that can go wrong in this subsystem is non-fatal: errors are
//! surfaced to the caller once and never retried automatically (the one
//! exception is the aggregator's bounded retry on a version conflict, which
//! is a concurrency miss, not a persistence failure).

use thiserror::Error;

/// Core error type for abide-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timed session was requested without a complete activity target.
    #[error("Select what to track before starting the timer")]
    SelectionRequired,

    /// An operation was attempted with no user identity configured.
    #[error("Not authenticated: no user identity is configured")]
    NotAuthenticated,

    /// Backing store read or write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: std::path::PathBuf,
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

    /// Conditional write lost to a concurrent writer (stale version).
    #[error("Concurrent update conflict")]
    Conflict,

    /// A row the operation requires does not exist.
    #[error("Row not found: {0}")]
    RowMissing(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
