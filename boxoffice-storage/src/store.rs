//! One physical store with an accessor per catalog entity type.

use crate::accessor::Accessor;
use crate::backend::{BackendKind, FlatFileBackend, MemoryBackend, RelationalBackend, StoreBackend};
use crate::cache::GlobalCache;
use crate::error::{StorageError, StorageResult};
use crate::observer::MutationObserver;
use boxoffice_model::Catalog;
use boxoffice_types::EntityType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// The accessors of every catalog entity type over a single backend.
pub struct DataStore {
    backend: Arc<dyn StoreBackend>,
    catalog: Catalog,
    accessors: BTreeMap<EntityType, Arc<Accessor>>,
}

impl DataStore {
    /// Builds accessors for every type in `catalog`, preparing the backend
    /// for each of them.
    pub fn new(backend: Arc<dyn StoreBackend>, catalog: &Catalog, cache: Arc<GlobalCache>) -> StorageResult<Self> {
        let mut accessors = BTreeMap::new();
        for schema in catalog.schemas() {
            backend.ensure_type(schema)?;
            accessors.insert(
                schema.entity_type.clone(),
                Arc::new(Accessor::new(schema.clone(), backend.clone(), cache.clone())),
            );
        }
        info!(
            "Opened {} store with {} entity types",
            backend.kind(),
            accessors.len()
        );
        Ok(Self {
            backend,
            catalog: catalog.clone(),
            accessors,
        })
    }

    /// Opens a SQLite-backed store at `path`.
    pub fn open_relational(path: &Path, catalog: &Catalog, cache: Arc<GlobalCache>) -> StorageResult<Self> {
        Self::new(Arc::new(RelationalBackend::open(path)?), catalog, cache)
    }

    /// Opens an in-memory SQLite store (for testing).
    pub fn open_relational_in_memory(catalog: &Catalog, cache: Arc<GlobalCache>) -> StorageResult<Self> {
        Self::new(Arc::new(RelationalBackend::open_in_memory()?), catalog, cache)
    }

    /// Opens a CSV-backed store in `dir`.
    pub fn open_flat_file(dir: impl Into<PathBuf>, catalog: &Catalog, cache: Arc<GlobalCache>) -> StorageResult<Self> {
        Self::new(Arc::new(FlatFileBackend::open(dir)?), catalog, cache)
    }

    /// Creates a store that lives only in process memory.
    pub fn in_memory(catalog: &Catalog, cache: Arc<GlobalCache>) -> StorageResult<Self> {
        Self::new(Arc::new(MemoryBackend::new()), catalog, cache)
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn accessor(&self, entity_type: &str) -> Option<&Arc<Accessor>> {
        self.accessors.get(entity_type)
    }

    /// Like [`DataStore::accessor`], but an unknown type is an error.
    pub fn require(&self, entity_type: &str) -> StorageResult<&Arc<Accessor>> {
        self.accessor(entity_type)
            .ok_or_else(|| StorageError::UnknownEntityType(entity_type.to_string()))
    }

    pub fn accessors(&self) -> impl Iterator<Item = &Arc<Accessor>> {
        self.accessors.values()
    }

    /// Registers `observer` on every accessor.
    pub fn add_observer_all(&self, observer: &Arc<dyn MutationObserver>) {
        for accessor in self.accessors.values() {
            accessor.add_observer(observer.clone());
        }
    }

    /// Unregisters `observer` from every accessor.
    pub fn remove_observer_all(&self, observer: &Arc<dyn MutationObserver>) {
        for accessor in self.accessors.values() {
            accessor.remove_observer(observer);
        }
    }

    /// Stored record count across every entity type.
    pub fn total_records(&self) -> StorageResult<usize> {
        let mut total = 0;
        for accessor in self.accessors.values() {
            total += accessor.count()?;
        }
        Ok(total)
    }
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("kind", &self.backend.kind())
            .field("entity_types", &self.accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}
