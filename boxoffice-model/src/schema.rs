use boxoffice_types::{EntityType, Error, Identity, Result};
use serde::{Deserialize, Serialize};

/// Describes how a store assigns identities to an entity type and which
/// other types its records point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: EntityType,
    pub id_strategy: IdStrategy,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<EntityType>, id_strategy: IdStrategy) -> Self {
        Self {
            entity_type: entity_type.into(),
            id_strategy,
            references: Vec::new(),
        }
    }

    /// Declares that `field` (a JSON pointer) holds the identity of a `target` record.
    #[must_use]
    pub fn references(mut self, field: &str, target: impl Into<EntityType>) -> Self {
        self.references.push(Reference {
            field: field.to_string(),
            target: target.into(),
        });
        self
    }

    /// Rejects an identity whose kind the id strategy cannot store as-is:
    /// `Sequence` types take integers, `Uuid` types take text.
    pub fn check_identity(&self, id: &Identity) -> Result<()> {
        let matches = match (self.id_strategy, id) {
            (IdStrategy::Sequence, Identity::Int(_)) => true,
            (IdStrategy::Uuid, Identity::Text(s)) => !s.is_empty(),
            _ => false,
        };
        if matches {
            Ok(())
        } else {
            Err(Error::InvalidIdentity(format!(
                "{} uses {:?} identities, got {:?}",
                self.entity_type, self.id_strategy, id
            )))
        }
    }

    /// Entity types this one depends on, excluding itself.
    pub fn dependencies(&self) -> impl Iterator<Item = &EntityType> {
        self.references
            .iter()
            .map(|r| &r.target)
            .filter(move |t| **t != self.entity_type)
    }
}

/// A stored foreign key: `field` holds the identity of a `target` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// JSON pointer path (e.g., "/manager_id").
    pub field: String,
    pub target: EntityType,
}

/// How a store generates an identity when the caller does not supply one.
///
/// Replication and bootstrap always supply one, so this only applies to
/// writes originating from application code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Next integer after the highest identity the store has seen.
    Sequence,
    /// Fresh UUID v7 string.
    Uuid,
}
