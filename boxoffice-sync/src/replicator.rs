//! Arming and disarming real-time replication between two stores.

use crate::observer::{CrossPersistenceObserver, ReplicationCounts};
use crate::sync_context::SyncContext;
use boxoffice_storage::{Accessor, DataStore, MutationObserver};
use std::sync::Arc;
use tracing::info;

struct Registration {
    accessor: Arc<Accessor>,
    observer: Arc<CrossPersistenceObserver>,
    handle: Arc<dyn MutationObserver>,
}

/// The set of replication observers currently registered.
///
/// [`Replicator::arm`] puts one [`CrossPersistenceObserver`] on every
/// accessor of the primary store, and with `bidirectional` a mirror set on
/// the secondary. All of them share one [`SyncContext`].
///
/// Each observer holds its target store, so with both directions armed the
/// two stores keep each other alive until the replicator is dropped.
pub struct Replicator {
    registrations: Vec<Registration>,
}

impl Replicator {
    pub fn arm(
        primary: &Arc<DataStore>,
        secondary: &Arc<DataStore>,
        sync: Arc<SyncContext>,
        bidirectional: bool,
    ) -> Self {
        let mut registrations = Vec::new();
        register(&mut registrations, primary, secondary, &sync);
        if bidirectional {
            register(&mut registrations, secondary, primary, &sync);
        }
        info!(
            "Replication armed: {} -> {}{} ({} observers)",
            primary.kind(),
            secondary.kind(),
            if bidirectional { " and back" } else { "" },
            registrations.len()
        );
        Self { registrations }
    }

    pub fn observer_count(&self) -> usize {
        self.registrations.len()
    }

    /// Counters summed over every observer.
    pub fn stats(&self) -> ReplicationCounts {
        self.registrations.iter().map(|r| r.observer.stats()).sum()
    }

    /// Unregisters every observer this replicator armed. Dropping the
    /// replicator does the same.
    pub fn disarm(self) {
        drop(self);
    }
}

impl Drop for Replicator {
    fn drop(&mut self) {
        for registration in &self.registrations {
            registration.accessor.remove_observer(&registration.handle);
        }
        info!("Replication disarmed ({} observers)", self.registrations.len());
    }
}

fn register(
    registrations: &mut Vec<Registration>,
    source: &Arc<DataStore>,
    target: &Arc<DataStore>,
    sync: &Arc<SyncContext>,
) {
    for accessor in source.accessors() {
        let observer = Arc::new(CrossPersistenceObserver::new(
            source.kind(),
            target.clone(),
            sync.clone(),
        ));
        let handle: Arc<dyn MutationObserver> = observer.clone();
        accessor.add_observer(handle.clone());
        registrations.push(Registration {
            accessor: accessor.clone(),
            observer,
            handle,
        });
    }
}

impl std::fmt::Debug for Replicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replicator")
            .field("observers", &self.registrations.len())
            .field("stats", &self.stats())
            .finish()
    }
}
