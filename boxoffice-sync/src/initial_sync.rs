//! Startup bootstrap: make the secondary store a copy of the primary.

use crate::error::{SyncError, SyncResult};
use crate::sync_context::SyncContext;
use boxoffice_storage::{BackendKind, DataStore};
use boxoffice_types::EntityType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What one bootstrap run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub primary: BackendKind,
    pub secondary: Option<BackendKind>,
    /// Records removed from the secondary before copying.
    pub wiped: usize,
    /// Records copied, per entity type, in copy order.
    pub copied: Vec<(EntityType, usize)>,
    /// The failure that stopped the run, if any.
    pub error: Option<String>,
}

impl BootstrapReport {
    fn new(primary: BackendKind) -> Self {
        Self {
            primary,
            secondary: None,
            wiped: 0,
            copied: Vec::new(),
            error: None,
        }
    }

    pub fn total_copied(&self) -> usize {
        self.copied.iter().map(|(_, n)| n).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Wipes one store and repopulates it from the other.
///
/// Entity types are copied in catalog dependency order, so referenced
/// records always exist before the records that point at them, and every
/// record keeps its identity. Running it again on an already-aligned pair
/// is harmless: the wipe removes whatever the secondary held before.
pub struct InitialSyncManager {
    stores: [Arc<DataStore>; 2],
    sync: Arc<SyncContext>,
}

impl InitialSyncManager {
    pub fn new(first: Arc<DataStore>, second: Arc<DataStore>, sync: Arc<SyncContext>) -> Self {
        Self {
            stores: [first, second],
            sync,
        }
    }

    /// Picks the store of kind `primary` as the source of truth.
    fn roles(&self, primary: BackendKind) -> SyncResult<(&Arc<DataStore>, &Arc<DataStore>)> {
        let [a, b] = &self.stores;
        if a.kind() == b.kind() {
            return Err(SyncError::SameBackend(a.kind()));
        }
        if a.kind() == primary {
            Ok((a, b))
        } else if b.kind() == primary {
            Ok((b, a))
        } else {
            Err(SyncError::UnknownPrimary(primary))
        }
    }

    /// Runs the bootstrap. A failure is logged and recorded in the report;
    /// the secondary may then be partially populated until the next run.
    pub fn perform_initial_sync(&self, primary: BackendKind) -> BootstrapReport {
        let mut report = BootstrapReport::new(primary);
        if let Err(e) = self.run(primary, &mut report) {
            error!(
                "Initial sync from {} failed, continuing with {} as the only authoritative store: {}",
                primary, primary, e
            );
            report.error = Some(e.to_string());
        }
        report
    }

    fn run(&self, primary: BackendKind, report: &mut BootstrapReport) -> SyncResult<()> {
        let (source, target) = self.roles(primary)?;
        report.secondary = Some(target.kind());
        let order = source.catalog().bootstrap_order()?;
        info!(
            "Initial sync: {} -> {} ({} entity types)",
            source.kind(),
            target.kind(),
            order.len()
        );

        // Writes below must not be replicated back by any armed observer.
        let _pass = self.sync.enter();

        for entity_type in order.iter().rev() {
            let removed = target.require(entity_type.as_str())?.clear()?;
            report.wiped += removed;
        }
        debug!("Wiped {} records from {}", report.wiped, target.kind());

        for entity_type in &order {
            let from = source.require(entity_type.as_str())?;
            let to = target.require(entity_type.as_str())?;
            let records = from.list()?;
            for record in &records {
                to.upsert(record)?;
            }
            debug!("Copied {} {} records", records.len(), entity_type);
            report.copied.push((entity_type.clone(), records.len()));
        }

        info!(
            "Initial sync complete: {} records copied to {}",
            report.total_copied(),
            target.kind()
        );
        Ok(())
    }

    /// Per-type record counts of both stores, for checking alignment.
    pub fn compare(&self) -> SyncResult<BTreeMap<EntityType, (usize, usize)>> {
        let [a, b] = &self.stores;
        let mut counts = BTreeMap::new();
        for accessor in a.accessors() {
            let other = b.require(accessor.entity_type().as_str())?;
            counts.insert(accessor.entity_type().clone(), (accessor.count()?, other.count()?));
        }
        Ok(counts)
    }
}
