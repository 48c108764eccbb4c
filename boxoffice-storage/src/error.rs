//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Flat-file encoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// No accessor is registered for the entity type.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A related record needed to build an object graph could not be loaded.
    #[error("hydration failed: {0}")]
    Hydration(String),

    /// A lock guarding a store handle was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}
