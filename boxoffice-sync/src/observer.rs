//! Real-time replication of committed writes to the other store.

use crate::error::{SyncError, SyncResult};
use crate::sync_context::SyncContext;
use boxoffice_storage::{
    BackendKind, DataStore, MutationObserver, ObserverResult, RecordEvent, UpsertOutcome,
};
use boxoffice_types::MutationOp;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Counters kept by one [`CrossPersistenceObserver`].
#[derive(Debug, Default)]
pub struct ReplicationStats {
    applied: AtomicU64,
    skipped_by_guard: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`ReplicationStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationCounts {
    /// Events replayed on the target store.
    pub applied: u64,
    /// Events ignored because a replication pass was already running.
    pub skipped_by_guard: u64,
    /// Events that could not be replayed; logged and dropped.
    pub failed: u64,
}

impl ReplicationStats {
    pub fn snapshot(&self) -> ReplicationCounts {
        ReplicationCounts {
            applied: self.applied.load(Ordering::Relaxed),
            skipped_by_guard: self.skipped_by_guard.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::ops::Add for ReplicationCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            applied: self.applied + rhs.applied,
            skipped_by_guard: self.skipped_by_guard + rhs.skipped_by_guard,
            failed: self.failed + rhs.failed,
        }
    }
}

impl std::iter::Sum for ReplicationCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, c| acc + c)
    }
}

/// Replays mutations committed on one store onto another.
///
/// Registered on the source store's accessors. For each event it opens a
/// replication pass on the shared [`SyncContext`] and writes the same
/// record, under the same identity, to the target store. The target's own
/// notification reaches any observer armed in the opposite direction while
/// the pass is still open, and that observer ignores it.
///
/// Replication is best effort: a failed replay is logged and counted, and
/// never reported back to the writer whose local commit already succeeded.
pub struct CrossPersistenceObserver {
    name: String,
    source: BackendKind,
    target: Arc<DataStore>,
    sync: Arc<SyncContext>,
    stats: ReplicationStats,
}

impl CrossPersistenceObserver {
    pub fn new(source: BackendKind, target: Arc<DataStore>, sync: Arc<SyncContext>) -> Self {
        Self {
            name: format!("replicate {} -> {}", source, target.kind()),
            source,
            target,
            sync,
            stats: ReplicationStats::default(),
        }
    }

    pub fn source(&self) -> BackendKind {
        self.source
    }

    pub fn target(&self) -> BackendKind {
        self.target.kind()
    }

    pub fn stats(&self) -> ReplicationCounts {
        self.stats.snapshot()
    }

    /// Replays one event on the target store.
    ///
    /// The caller must already hold a replication pass.
    pub fn replay(&self, event: &RecordEvent) -> SyncResult<()> {
        let accessor = self.target.require(event.entity_type.as_str())?;

        match event.op {
            MutationOp::Insert | MutationOp::Update => {
                let record = event.payload.as_ref().ok_or_else(|| SyncError::MissingPayload {
                    op: event.op,
                    key: event.key(),
                })?;
                if record.entity_type != event.entity_type || record.id != event.id {
                    return Err(SyncError::MalformedPayload(format!(
                        "{} event for {} carries {}",
                        event.op,
                        event.key(),
                        record.key()
                    )));
                }
                let outcome = accessor.upsert(record)?;
                if event.op == MutationOp::Insert && outcome == UpsertOutcome::Updated {
                    debug!("{} already present in {}, updated in place", record.key(), self.target());
                }
            }
            MutationOp::Delete => {
                if !accessor.delete(&event.id)? {
                    debug!("{} already absent from {}", event.key(), self.target());
                }
            }
        }
        Ok(())
    }
}

impl MutationObserver for CrossPersistenceObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_mutation(&self, event: &RecordEvent) -> ObserverResult {
        if self.sync.is_syncing() {
            self.stats.skipped_by_guard.fetch_add(1, Ordering::Relaxed);
            debug!("{}: replication pass active, ignoring {} {}", self.name, event.op, event.key());
            return Ok(());
        }

        let _pass = self.sync.enter();
        match self.replay(event) {
            Ok(()) => {
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
                debug!("{}: replicated {} {}", self.name, event.op, event.key());
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "{}: failed to replicate {} {}, stores may diverge until the next bootstrap: {}",
                    self.name,
                    event.op,
                    event.key(),
                    e
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CrossPersistenceObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossPersistenceObserver")
            .field("source", &self.source)
            .field("target", &self.target.kind())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
