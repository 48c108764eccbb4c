use boxoffice_types::{EntityKey, EntityType, Identity};
use serde::{Deserialize, Serialize};

/// A persisted record as every store sees it.
///
/// The replication engine never interprets `data`: each store encodes it
/// however it likes (a JSON column, a CSV cell) and the observers copy it
/// verbatim. Business fields are whatever the catalog's entity types put in
/// there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity_type: EntityType,
    pub id: Identity,
    pub data: serde_json::Value,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new(entity_type: impl Into<EntityType>, id: impl Into<Identity>, data: serde_json::Value) -> Self {
        let now = now_millis();
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            data,
            created_at: now,
            modified_at: now,
        }
    }

    /// Returns the `(type, identity)` key of this record.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey {
            entity_type: self.entity_type.clone(),
            id: self.id.clone(),
        }
    }

    /// Returns a copy carrying a different identity.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Identity>) -> Self {
        self.id = id.into();
        self
    }

    /// Bumps `modified_at` to now.
    pub fn touch(&mut self) {
        self.modified_at = now_millis();
    }

    /// Equality on type, identity and data, ignoring store bookkeeping.
    #[must_use]
    pub fn same_business_fields(&self, other: &Record) -> bool {
        self.entity_type == other.entity_type && self.id == other.id && self.data == other.data
    }

    /// Extract a string value from `data` using a JSON pointer (e.g., "/name").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract an integer value from `data` using a JSON pointer.
    pub fn get_i64(&self, pointer: &str) -> Option<i64> {
        self.data.pointer(pointer).and_then(|v| v.as_i64())
    }

    /// Extract a boolean value from `data` using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.data.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Resolves a stored foreign identity.
    ///
    /// Integers become [`Identity::Int`], non-empty strings
    /// [`Identity::Text`]; anything else (null, missing) is no reference.
    pub fn reference(&self, pointer: &str) -> Option<Identity> {
        match self.data.pointer(pointer)? {
            serde_json::Value::Number(n) => n.as_i64().map(Identity::Int),
            serde_json::Value::String(s) if !s.is_empty() => Some(Identity::Text(s.clone())),
            _ => None,
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
