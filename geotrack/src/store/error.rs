//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the local database.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value could not be (de)serialized.
    #[error("Corrupt stored value for '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored timestamp could not be parsed.
    #[error("Invalid stored timestamp '{0}'")]
    InvalidTimestamp(String),

    /// The database directory could not be created.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
