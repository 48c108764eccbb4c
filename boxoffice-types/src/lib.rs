//! Core type definitions for the box office persistence layer.
//!
//! This crate defines the store-agnostic vocabulary used by every other
//! crate in the workspace:
//! - Entity types and identities, and the `(type, identity)` key pair
//! - Mutation events (insert, update, delete) emitted after a commit
//!
//! Nothing here knows about bookings or venues; those live in the entity
//! catalog of `boxoffice-model`.

mod event;
mod ids;

pub use event::{MutationEvent, MutationOp};
pub use ids::{EntityKey, EntityType, Identity};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("dependency cycle between entity types: {0}")]
    DependencyCycle(String),
}
