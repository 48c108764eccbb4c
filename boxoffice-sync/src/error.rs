//! Error types for the sync layer.

use boxoffice_storage::{BackendKind, StorageError};
use boxoffice_types::{EntityKey, MutationOp};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while replicating or bootstrapping.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The target store rejected the replicated write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The catalog cannot be ordered for bootstrap.
    #[error("model error: {0}")]
    Model(#[from] boxoffice_types::Error),

    /// An insert or update event arrived without its entity.
    #[error("{op} event for {key} carries no payload")]
    MissingPayload { op: MutationOp, key: EntityKey },

    /// The event's payload does not describe the record the event names.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Neither store matches the requested primary.
    #[error("no store of kind {0} to bootstrap from")]
    UnknownPrimary(BackendKind),

    /// Both stores have the same kind, so primary and secondary are ambiguous.
    #[error("both stores are {0}")]
    SameBackend(BackendKind),
}
