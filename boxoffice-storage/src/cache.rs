//! Process-wide read-through cache shared by every accessor.

use boxoffice_model::Record;
use boxoffice_types::EntityKey;
use dashmap::DashMap;
use tracing::debug;

/// Last known good record per `(type, identity)`.
///
/// One instance is shared by every accessor of every store. Accessors put
/// on read-miss and on every write, and remove on delete, so within one
/// process an entry is never older than the last committed write to its
/// key. There is no eviction, TTL or capacity bound: entries live until
/// removed or until [`GlobalCache::clear_all`] at session end.
#[derive(Debug, Default)]
pub struct GlobalCache {
    entries: DashMap<EntityKey, Record>,
}

impl GlobalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the entry for `key`. Empty keys are ignored.
    pub fn put(&self, key: EntityKey, record: Record) {
        if key.is_empty() {
            return;
        }
        self.entries.insert(key, record);
    }

    /// Caches a record under its own key.
    pub fn put_record(&self, record: &Record) {
        self.put(record.key(), record.clone());
    }

    pub fn get(&self, key: &EntityKey) -> Option<Record> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops the entry for `key`, if any.
    pub fn remove(&self, key: &EntityKey) {
        self.entries.remove(key);
    }

    /// Drops every entry.
    pub fn clear_all(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!("Cleared {} cached records", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
