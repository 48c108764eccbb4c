//! Identifier types shared by every store.
//!
//! An [`Identity`] is the logical primary key of a record within its
//! [`EntityType`]. The same logical record carries the same identity in
//! every store it is replicated to.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of a class of records (e.g. `"venue"`, `"booking"`).
///
/// Stable across stores: the relational table and the flat file for a type
/// are both derived from this name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Creates an entity type from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty name, which no store accepts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EntityType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Logical primary key of a record, store-agnostic once resolved.
///
/// Serialized untagged so `7` and `"7"` stay distinguishable on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    /// Sequence-generated key.
    Int(i64),
    /// Free-form key (usernames, UUIDs).
    Text(String),
}

impl Identity {
    /// Creates a fresh time-ordered textual identity (UUID v7).
    #[must_use]
    pub fn new_uuid() -> Self {
        Self::Text(Uuid::now_v7().to_string())
    }

    /// Returns the integer value for sequence identities.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// True for an empty textual identity, which no store accepts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for Identity {
    type Err = std::convert::Infallible;

    /// Integers parse as [`Identity::Int`], everything else as [`Identity::Text`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Int))
    }
}

impl From<i64> for Identity {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Identity {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// `(entity type, identity)` pair addressing one logical record.
///
/// Used as the cache key and as the loading-guard key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: EntityType,
    pub id: Identity,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<EntityType>, id: impl Into<Identity>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// True if either half of the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_type.is_empty() || self.id.is_empty()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}
