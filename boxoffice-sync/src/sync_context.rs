//! Per-thread replication guard.
//!
//! While a replication pass runs on a thread, writes it performs on the
//! target store fire their own mutation events. Observers check
//! [`SyncContext::is_syncing`] and ignore those events, which is what stops
//! a write from bouncing between the two stores forever.

use dashmap::DashMap;
use std::thread::{self, ThreadId};

/// Tracks, per thread, how many replication passes are active.
///
/// The state is a depth counter rather than a flag: nested `start_sync`
/// calls keep the thread syncing until the same number of `end_sync` calls,
/// and an unmatched `end_sync` leaves the count at zero. Threads never see
/// each other's count.
#[derive(Debug, Default)]
pub struct SyncContext {
    depth: DashMap<ThreadId, usize>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a replication pass is active on the calling thread.
    pub fn is_syncing(&self) -> bool {
        self.depth().map_or(false, |d| d > 0)
    }

    /// Marks the calling thread as replicating.
    pub fn start_sync(&self) {
        *self.depth.entry(thread::current().id()).or_insert(0) += 1;
    }

    /// Ends one replication pass on the calling thread. A call with no
    /// matching start is a no-op.
    pub fn end_sync(&self) {
        let id = thread::current().id();
        if let Some(mut depth) = self.depth.get_mut(&id) {
            *depth = depth.saturating_sub(1);
        }
        self.depth.remove_if(&id, |_, depth| *depth == 0);
    }

    /// Starts a replication pass that ends when the guard drops, including
    /// during a panic unwind.
    pub fn enter(&self) -> SyncGuard<'_> {
        self.start_sync();
        SyncGuard { context: self }
    }

    /// Nesting depth on the calling thread, if any pass is active.
    fn depth(&self) -> Option<usize> {
        self.depth.get(&thread::current().id()).map(|d| *d)
    }

    /// Number of threads with an active replication pass.
    pub fn active_threads(&self) -> usize {
        self.depth.len()
    }
}

/// Scope of one replication pass; see [`SyncContext::enter`].
#[must_use = "the replication pass ends as soon as the guard is dropped"]
pub struct SyncGuard<'a> {
    context: &'a SyncContext,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.context.end_sync();
    }
}
