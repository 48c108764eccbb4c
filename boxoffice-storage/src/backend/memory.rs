//! In-memory store, used for tests and as a scratch secondary.

use super::{sequence_after, BackendKind, StoreBackend, UpsertOutcome};
use crate::error::{StorageError, StorageResult};
use boxoffice_model::{EntitySchema, IdStrategy, Record};
use boxoffice_types::{EntityType, Identity};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<Identity, Record>,
    /// Highest integer identity ever stored; generated ids are never reused.
    high_water: i64,
}

impl Table {
    fn put(&mut self, record: Record) -> Option<Record> {
        if let Some(v) = record.id.as_int() {
            self.high_water = self.high_water.max(v);
        }
        self.rows.insert(record.id.clone(), record)
    }
}

/// Store holding every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<EntityType, Table>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<EntityType, Table>>> {
        self.tables
            .read()
            .map_err(|e| StorageError::Poisoned(format!("memory store: {e}")))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<EntityType, Table>>> {
        self.tables
            .write()
            .map_err(|e| StorageError::Poisoned(format!("memory store: {e}")))
    }
}

impl StoreBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn ensure_type(&self, schema: &EntitySchema) -> StorageResult<()> {
        self.write()?.entry(schema.entity_type.clone()).or_default();
        Ok(())
    }

    fn fetch(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<Option<Record>> {
        Ok(self
            .read()?
            .get(entity_type)
            .and_then(|t| t.rows.get(id))
            .cloned())
    }

    fn fetch_all(&self, entity_type: &EntityType) -> StorageResult<Vec<Record>> {
        Ok(self
            .read()?
            .get(entity_type)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn insert_generated(&self, schema: &EntitySchema, mut record: Record) -> StorageResult<Record> {
        let mut tables = self.write()?;
        let table = tables.entry(schema.entity_type.clone()).or_default();
        record.id = match schema.id_strategy {
            IdStrategy::Sequence => Identity::Int(sequence_after(table.high_water)?),
            IdStrategy::Uuid => Identity::new_uuid(),
        };
        table.put(record.clone());
        Ok(record)
    }

    fn upsert(&self, record: &Record) -> StorageResult<UpsertOutcome> {
        let mut tables = self.write()?;
        let table = tables.entry(record.entity_type.clone()).or_default();
        Ok(match table.put(record.clone()) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    fn update(&self, record: &Record) -> StorageResult<bool> {
        let mut tables = self.write()?;
        let Some(existing) = tables
            .get_mut(&record.entity_type)
            .and_then(|t| t.rows.get_mut(&record.id))
        else {
            return Ok(false);
        };
        existing.data = record.data.clone();
        existing.modified_at = record.modified_at;
        Ok(true)
    }

    fn delete(&self, entity_type: &EntityType, id: &Identity) -> StorageResult<bool> {
        Ok(self
            .write()?
            .get_mut(entity_type)
            .and_then(|t| t.rows.remove(id))
            .is_some())
    }

    fn clear(&self, entity_type: &EntityType) -> StorageResult<usize> {
        let mut tables = self.write()?;
        let Some(table) = tables.get_mut(entity_type) else {
            return Ok(0);
        };
        let removed = table.rows.len();
        table.rows.clear();
        Ok(removed)
    }

    fn count(&self, entity_type: &EntityType) -> StorageResult<usize> {
        Ok(self.read()?.get(entity_type).map_or(0, |t| t.rows.len()))
    }
}
