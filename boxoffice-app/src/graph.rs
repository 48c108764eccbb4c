//! Hydration of the venue / venue manager object graph.
//!
//! A venue points at its manager and a manager lists the venues it runs,
//! so hydrating either side naively never terminates. Every hydration call
//! registers its key in the [`LoadingContext`]; a nested call for a key that
//! is already loading on this thread returns the record without its
//! relations instead of recursing.

use boxoffice_model::Record;
use boxoffice_model::types::{VENUE, VENUE_MANAGER};
use boxoffice_storage::{DataStore, LoadingContext, StorageError, StorageResult};
use boxoffice_types::{EntityKey, Identity};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: Identity,
    pub name: String,
    pub record: Record,
    /// `None` when the venue has no manager or the relation was not
    /// resolved (see `partial`).
    pub manager: Option<VenueManager>,
    /// True if this venue was reached while already being hydrated higher
    /// up the call stack, so its relations were left empty.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenueManager {
    pub id: Identity,
    pub user_id: Option<Identity>,
    pub record: Record,
    pub venues: Vec<Venue>,
    pub partial: bool,
}

impl Venue {
    fn bare(record: Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.get_str("/name").unwrap_or_default().to_string(),
            record,
            manager: None,
            partial: true,
        }
    }
}

impl VenueManager {
    fn bare(record: Record) -> Self {
        Self {
            id: record.id.clone(),
            user_id: record.reference("/user_id"),
            record,
            venues: Vec::new(),
            partial: true,
        }
    }
}

pub struct VenueGraph {
    store: Arc<DataStore>,
    loading: Arc<LoadingContext>,
}

impl VenueGraph {
    pub fn new(store: Arc<DataStore>, loading: Arc<LoadingContext>) -> Self {
        Self { store, loading }
    }

    /// Loads a venue together with its manager and the manager's venues.
    ///
    /// Fails with [`StorageError::Hydration`] if the venue names a manager
    /// that does not exist.
    pub fn load_venue(&self, id: &Identity) -> StorageResult<Venue> {
        let record = self.store.require(VENUE)?.require(id)?;
        let key = EntityKey::new(VENUE, id.clone());
        let Some(_loading) = self.loading.enter(&key) else {
            debug!("{} already loading, returning it unresolved", key);
            return Ok(Venue::bare(record));
        };

        let manager = match record.reference("/manager_id") {
            Some(manager_id) => Some(self.load_manager(&manager_id).map_err(|e| match e {
                StorageError::NotFound(_) => StorageError::Hydration(format!(
                    "{key} references missing {VENUE_MANAGER} {manager_id}"
                )),
                other => other,
            })?),
            None => None,
        };

        let mut venue = Venue::bare(record);
        venue.manager = manager;
        venue.partial = false;
        Ok(venue)
    }

    /// Loads a manager together with every venue that names it.
    pub fn load_manager(&self, id: &Identity) -> StorageResult<VenueManager> {
        let record = self.store.require(VENUE_MANAGER)?.require(id)?;
        let key = EntityKey::new(VENUE_MANAGER, id.clone());
        let Some(_loading) = self.loading.enter(&key) else {
            debug!("{} already loading, returning it unresolved", key);
            return Ok(VenueManager::bare(record));
        };

        let link = serde_json::to_value(id)?;
        let mut venues = Vec::new();
        for venue in self.store.require(VENUE)?.find_by("/manager_id", &link)? {
            venues.push(self.load_venue(&venue.id)?);
        }

        let mut manager = VenueManager::bare(record);
        manager.venues = venues;
        manager.partial = false;
        Ok(manager)
    }
}
