//! Flat-file store: one CSV file per entity type.
//!
//! Each write rewrites the whole file through a temporary sibling and an
//! atomic rename, so a reader never sees a half-written table.

use super::{next_sequence, validate_type_name, BackendKind, StoreBackend, UpsertOutcome};
use crate::error::{StorageError, StorageResult};
use boxoffice_model::{EntitySchema, IdStrategy, Record};
use boxoffice_types::{EntityType, Identity};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const HEADER: [&str; 5] = ["id", "id_kind", "data", "created_at", "modified_at"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum IdKind {
    Int,
    Text,
}

/// One line of an entity file. `data` holds the record's JSON.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    id_kind: IdKind,
    data: String,
    created_at: i64,
    modified_at: i64,
}

impl CsvRow {
    fn from_record(record: &Record) -> StorageResult<Self> {
        let id_kind = match record.id {
            Identity::Int(_) => IdKind::Int,
            Identity::Text(_) => IdKind::Text,
        };
        Ok(Self {
            id: record.id.to_string(),
            id_kind,
            data: serde_json::to_string(&record.data)?,
            created_at: record.created_at,
            modified_at: record.modified_at,
        })
    }

    fn into_record(self, entity_type: &EntityType) -> StorageResult<Record> {
        let id = match self.id_kind {
            IdKind::Int => Identity::Int(self.id.parse().map_err(|e| {
                StorageError::InvalidData(format!("bad integer id {:?} in {entity_type}: {e}", self.id))
            })?),
            IdKind::Text => Identity::Text(self.id),
        };
        Ok(Record {
            entity_type: entity_type.clone(),
            id,
            data: serde_json::from_str(&self.data)?,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

/// CSV-backed store rooted at a directory.
pub struct FlatFileBackend {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileBackend {
    /// Opens (or creates) a store in the given directory.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened flat-file store at {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| StorageError::Poisoned(format!("flat-file store: {e}")))
    }

    fn path(&self, entity_type: &EntityType) -> StorageResult<PathBuf> {
        validate_type_name(entity_type)?;
        Ok(self.dir.join(format!("{}.csv", entity_type.as_str())))
    }

    fn read(&self, entity_type: &EntityType) -> StorageResult<Vec<Record>> {
        let path = self.path(entity_type)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            records.push(row?.into_record(entity_type)?);
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn write(&self, entity_type: &EntityType, records: &[Record]) -> StorageResult<()> {
        let path = self.path(entity_type)?;
        let tmp = path.with_extension("csv.tmp");

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        writer.write_record(HEADER)?;
        for record in records {
            writer.serialize(CsvRow::from_record(record)?)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StoreBackend for FlatFileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FlatFile
    }

    fn ensure_type(&self, schema: &EntitySchema) -> StorageResult<()> {
        let _guard = self.lock()?;
        if !self.path(&schema.entity_type)?.exists() {
            self.write(&schema.entity_type, &[])?;
        }
        Ok(())
    }

    fn fetch(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<Option<Record>> {
        let _guard = self.lock()?;
        Ok(self.read(entity_type)?.into_iter().find(|r| &r.id == id))
    }

    fn fetch_all(&self, entity_type: &EntityType) -> StorageResult<Vec<Record>> {
        let _guard = self.lock()?;
        self.read(entity_type)
    }

    fn insert_generated(&self, schema: &EntitySchema, mut record: Record) -> StorageResult<Record> {
        let _guard = self.lock()?;
        let mut records = self.read(&schema.entity_type)?;
        record.id = match schema.id_strategy {
            IdStrategy::Sequence => Identity::Int(next_sequence(records.iter())?),
            IdStrategy::Uuid => Identity::new_uuid(),
        };
        records.push(record.clone());
        self.write(&schema.entity_type, &records)?;
        Ok(record)
    }

    fn upsert(&self, record: &Record) -> StorageResult<UpsertOutcome> {
        let _guard = self.lock()?;
        let mut records = self.read(&record.entity_type)?;
        let outcome = match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                UpsertOutcome::Updated
            }
            None => {
                records.push(record.clone());
                UpsertOutcome::Inserted
            }
        };
        self.write(&record.entity_type, &records)?;
        Ok(outcome)
    }

    fn update(&self, record: &Record) -> StorageResult<bool> {
        let _guard = self.lock()?;
        let mut records = self.read(&record.entity_type)?;
        let Some(existing) = records.iter_mut().find(|r| r.id == record.id) else {
            return Ok(false);
        };
        existing.data = record.data.clone();
        existing.modified_at = record.modified_at;
        self.write(&record.entity_type, &records)?;
        Ok(true)
    }

    fn delete(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<bool> {
        let _guard = self.lock()?;
        let mut records = self.read(entity_type)?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write(entity_type, &records)?;
        Ok(true)
    }

    fn clear(&self, entity_type: &EntityType) -> StorageResult<usize> {
        let _guard = self.lock()?;
        let removed = self.read(entity_type)?.len();
        self.write(entity_type, &[])?;
        Ok(removed)
    }
}
