//! Mutation events emitted after a committed write.
//!
//! Events are created by an accessor immediately after a successful local
//! commit and consumed synchronously by every registered observer. They are
//! never persisted or queued: if nobody is listening the event is lost, and
//! a full resync is the recovery path.

use crate::{EntityKey, EntityType, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of write that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOp {
    Insert,
    Update,
    Delete,
}

impl MutationOp {
    /// True for operations that must carry a payload.
    #[must_use]
    pub const fn carries_payload(self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// `(operation, entity type, identity, payload)` describing one committed write.
///
/// `P` is the materialized entity. The payload is present for inserts and
/// updates and absent for deletes; observers treat a missing payload on an
/// insert or update as a contract violation by the emitting accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent<P> {
    pub op: MutationOp,
    pub entity_type: EntityType,
    pub id: Identity,
    pub payload: Option<P>,
}

impl<P> MutationEvent<P> {
    /// Creates an insert event.
    pub fn insert(entity_type: impl Into<EntityType>, id: impl Into<Identity>, payload: P) -> Self {
        Self {
            op: MutationOp::Insert,
            entity_type: entity_type.into(),
            id: id.into(),
            payload: Some(payload),
        }
    }

    /// Creates an update event.
    pub fn update(entity_type: impl Into<EntityType>, id: impl Into<Identity>, payload: P) -> Self {
        Self {
            op: MutationOp::Update,
            entity_type: entity_type.into(),
            id: id.into(),
            payload: Some(payload),
        }
    }

    /// Creates a delete event.
    pub fn delete(entity_type: impl Into<EntityType>, id: impl Into<Identity>) -> Self {
        Self {
            op: MutationOp::Delete,
            entity_type: entity_type.into(),
            id: id.into(),
            payload: None,
        }
    }

    /// Returns the key this event addresses.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey {
            entity_type: self.entity_type.clone(),
            id: self.id.clone(),
        }
    }
}
