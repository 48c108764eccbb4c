//! Store backends.
//!
//! A backend knows how to persist records of any registered entity type in
//! one physical store. It does no caching and emits no events; the
//! [`Accessor`](crate::Accessor) layered on top does both.

mod flat_file;
mod memory;
mod relational;

pub use flat_file::FlatFileBackend;
pub use memory::MemoryBackend;
pub use relational::RelationalBackend;

use crate::error::{StorageError, StorageResult};
use boxoffice_model::{EntitySchema, Record};
use boxoffice_types::{EntityType, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The physical store behind a [`DataStore`](crate::DataStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// SQLite database.
    Relational,
    /// One CSV file per entity type.
    FlatFile,
    /// Process memory, lost on exit.
    Memory,
}

impl BackendKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::FlatFile => "flat_file",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relational" | "sqlite" | "sql" => Ok(Self::Relational),
            "flat_file" | "flat-file" | "file" | "csv" => Ok(Self::FlatFile),
            "memory" | "in-memory" | "in_memory" => Ok(Self::Memory),
            other => Err(StorageError::InvalidData(format!("unknown backend: {other}"))),
        }
    }
}

/// Whether an identity-preserving write created or replaced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Raw record persistence for one physical store.
pub trait StoreBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Prepares storage for an entity type (table, file). Idempotent.
    fn ensure_type(&self, schema: &EntitySchema) -> StorageResult<()>;

    fn fetch(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<Option<Record>>;

    /// All records of a type, ordered by identity.
    fn fetch_all(&self, entity_type: &EntityType) -> StorageResult<Vec<Record>>;

    /// Records whose `data` has `value` at JSON pointer `field`.
    fn fetch_where(
        &self,
        entity_type: &EntityType,
        field: &str,
        value: &serde_json::Value,
    ) -> StorageResult<Vec<Record>> {
        Ok(filter_by_field(self.fetch_all(entity_type)?, field, value))
    }

    /// Inserts `record`, letting the store assign its identity according to
    /// the schema's strategy. The identity on `record` is ignored.
    fn insert_generated(&self, schema: &EntitySchema, record: Record) -> StorageResult<Record>;

    /// Inserts `record` under its own identity, or replaces the data of the
    /// record already stored under that identity.
    fn upsert(&self, record: &Record) -> StorageResult<UpsertOutcome>;

    /// Replaces an existing record. Returns false if it was absent.
    fn update(&self, record: &Record) -> StorageResult<bool>;

    /// Removes a record. Returns false if it was absent.
    fn delete(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<bool>;

    /// Removes every record of a type, returning how many were removed.
    fn clear(&self, entity_type: &EntityType) -> StorageResult<usize>;

    fn count(&self, entity_type: &EntityType) -> StorageResult<usize> {
        Ok(self.fetch_all(entity_type)?.len())
    }
}

/// Rejects type names that cannot double as a table or file name.
pub(crate) fn validate_type_name(entity_type: &EntityType) -> StorageResult<()> {
    let name = entity_type.as_str();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidData(format!(
            "entity type name must match [a-z0-9_]+: {name:?}"
        )))
    }
}

/// Next sequence value after the highest integer identity in `records`.
pub(crate) fn next_sequence<'a>(records: impl Iterator<Item = &'a Record>) -> StorageResult<i64> {
    sequence_after(records.filter_map(|r| r.id.as_int()).max().unwrap_or(0))
}

/// `last + 1`, or an error once `i64::MAX` has been handed out.
pub(crate) fn sequence_after(last: i64) -> StorageResult<i64> {
    last.checked_add(1)
        .ok_or_else(|| StorageError::InvalidData("identity sequence exhausted".to_string()))
}

/// Keeps the records whose `data` has `value` at JSON pointer `field`.
pub(crate) fn filter_by_field(
    records: Vec<Record>,
    field: &str,
    value: &serde_json::Value,
) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| r.data.pointer(field) == Some(value))
        .collect()
}
