//! Observable, cached accessor for one entity type in one store.

use crate::backend::{BackendKind, StoreBackend, UpsertOutcome};
use crate::cache::GlobalCache;
use crate::error::{StorageError, StorageResult};
use crate::observer::{Delivery, MutationObserver, ObserverRegistry, RecordEvent};
use boxoffice_model::{EntitySchema, Record};
use boxoffice_types::{EntityKey, EntityType, Identity, MutationEvent};
use std::sync::Arc;
use tracing::debug;

/// CRUD access to one entity type in one store.
///
/// Reads go through the shared [`GlobalCache`]; every committed write
/// refreshes or evicts the cache entry and then notifies the registered
/// observers exactly once. Failed writes notify nobody.
///
/// Two insertion modes exist. [`Accessor::insert`] lets the store generate
/// the identity and is what application code uses. [`Accessor::upsert`]
/// keeps the caller's identity and is reserved for replication and
/// bootstrap, so the same logical record ends up under the same identity
/// in every store.
pub struct Accessor {
    schema: EntitySchema,
    backend: Arc<dyn StoreBackend>,
    cache: Arc<GlobalCache>,
    observers: ObserverRegistry,
}

impl Accessor {
    pub fn new(schema: EntitySchema, backend: Arc<dyn StoreBackend>, cache: Arc<GlobalCache>) -> Self {
        Self {
            schema,
            backend,
            cache,
            observers: ObserverRegistry::new(),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.schema.entity_type
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    fn key(&self, id: &Identity) -> EntityKey {
        EntityKey {
            entity_type: self.schema.entity_type.clone(),
            id: id.clone(),
        }
    }

    fn check_type(&self, record: &Record) -> StorageResult<()> {
        if record.entity_type != self.schema.entity_type {
            return Err(StorageError::InvalidData(format!(
                "{} accessor cannot store a {} record",
                self.schema.entity_type, record.entity_type
            )));
        }
        self.schema
            .check_identity(&record.id)
            .map_err(|e| StorageError::InvalidData(e.to_string()))
    }

    // ── Observers ────────────────────────────────────────────────

    /// Registers an observer. Duplicates are ignored.
    pub fn add_observer(&self, observer: Arc<dyn MutationObserver>) -> bool {
        self.observers.add(observer)
    }

    /// Unregisters an observer. Idempotent.
    pub fn remove_observer(&self, observer: &Arc<dyn MutationObserver>) -> bool {
        self.observers.remove(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Fans a committed mutation out to the registered observers.
    pub fn notify_observers(&self, event: &RecordEvent) -> Delivery {
        let delivery = self.observers.notify(event);
        if delivery.failed > 0 {
            debug!(
                "{} of {} observers failed on {} {}#{}",
                delivery.failed,
                delivery.failed + delivery.delivered,
                event.op,
                event.entity_type,
                event.id
            );
        }
        delivery
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Returns the record with this identity, from cache if present.
    ///
    /// The cache is keyed by `(type, identity)` only and is shared by every
    /// store. If a replicated write failed, this store may answer with the
    /// other store's cached record until the entry is evicted; use
    /// [`Accessor::list`] or [`Accessor::count`] to see what this store
    /// actually holds.
    pub fn get(&self, id: &Identity) -> StorageResult<Option<Record>> {
        let key = self.key(id);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(cached));
        }
        let fetched = self.backend.fetch(&self.schema.entity_type, id)?;
        if let Some(record) = &fetched {
            self.cache.put(key, record.clone());
        }
        Ok(fetched)
    }

    /// Like [`Accessor::get`], but a missing record is an error.
    pub fn require(&self, id: &Identity) -> StorageResult<Record> {
        self.get(id)?
            .ok_or_else(|| StorageError::NotFound(self.key(id).to_string()))
    }

    /// Every record of this type, read from the store.
    pub fn list(&self) -> StorageResult<Vec<Record>> {
        let records = self.backend.fetch_all(&self.schema.entity_type)?;
        for record in &records {
            self.cache.put_record(record);
        }
        Ok(records)
    }

    /// Records whose `data` has `value` at JSON pointer `field`.
    pub fn find_by(&self, field: &str, value: &serde_json::Value) -> StorageResult<Vec<Record>> {
        let records = self
            .backend
            .fetch_where(&self.schema.entity_type, field, value)?;
        for record in &records {
            self.cache.put_record(record);
        }
        Ok(records)
    }

    /// Number of stored records, bypassing the cache.
    pub fn count(&self) -> StorageResult<usize> {
        self.backend.count(&self.schema.entity_type)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts new data under a store-generated identity.
    pub fn insert(&self, data: serde_json::Value) -> StorageResult<Record> {
        let draft = Record::new(self.schema.entity_type.clone(), Identity::Int(0), data);
        let record = self.backend.insert_generated(&self.schema, draft)?;
        self.cache.put_record(&record);
        debug!("Inserted {}", record.key());

        self.notify_observers(&MutationEvent::insert(
            record.entity_type.clone(),
            record.id.clone(),
            record.clone(),
        ));
        Ok(record)
    }

    /// Inserts `record` under its own identity, or updates the record already
    /// stored under it in place.
    pub fn upsert(&self, record: &Record) -> StorageResult<UpsertOutcome> {
        self.check_type(record)?;
        let outcome = self.backend.upsert(record)?;
        self.cache.put_record(record);
        debug!("Upserted {} ({:?})", record.key(), outcome);

        let event = match outcome {
            UpsertOutcome::Inserted => {
                MutationEvent::insert(record.entity_type.clone(), record.id.clone(), record.clone())
            }
            UpsertOutcome::Updated => {
                MutationEvent::update(record.entity_type.clone(), record.id.clone(), record.clone())
            }
        };
        self.notify_observers(&event);
        Ok(outcome)
    }

    /// Identity-preserving insert; an alias for [`Accessor::upsert`].
    pub fn insert_with_id(&self, record: &Record) -> StorageResult<UpsertOutcome> {
        self.upsert(record)
    }

    /// Replaces the data of an existing record and bumps `modified_at`.
    pub fn update(&self, record: &Record) -> StorageResult<Record> {
        self.check_type(record)?;
        let mut updated = record.clone();
        updated.touch();
        if !self.backend.update(&updated)? {
            return Err(StorageError::NotFound(record.key().to_string()));
        }
        // The store keeps its own created_at; reload so the cache matches it.
        let stored = self
            .backend
            .fetch(&self.schema.entity_type, &updated.id)?
            .unwrap_or(updated);
        self.cache.put_record(&stored);
        debug!("Updated {}", stored.key());

        self.notify_observers(&MutationEvent::update(
            stored.entity_type.clone(),
            stored.id.clone(),
            stored.clone(),
        ));
        Ok(stored)
    }

    /// Deletes a record. Returns false, and notifies nobody, if it was absent.
    pub fn delete(&self, id: &Identity) -> StorageResult<bool> {
        let removed = self.backend.delete(&self.schema.entity_type, id)?;
        let key = self.key(id);
        self.cache.remove(&key);
        if !removed {
            return Ok(false);
        }
        debug!("Deleted {}", key);

        self.notify_observers(&MutationEvent::delete(key.entity_type, key.id));
        Ok(true)
    }

    /// Removes every record of this type without notifying observers.
    ///
    /// Only the bootstrap wipe uses this: it runs before replication is
    /// armed, and a wipe must never propagate to the primary store.
    pub fn clear(&self) -> StorageResult<usize> {
        let ids: Vec<Identity> = self
            .backend
            .fetch_all(&self.schema.entity_type)?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let removed = self.backend.clear(&self.schema.entity_type)?;
        for id in &ids {
            self.cache.remove(&self.key(id));
        }
        debug!("Cleared {} {} records", removed, self.schema.entity_type);
        Ok(removed)
    }
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("entity_type", &self.schema.entity_type)
            .field("backend", &self.backend.kind())
            .field("observers", &self.observers.len())
            .finish()
    }
}
