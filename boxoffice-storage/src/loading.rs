//! Per-thread reentrancy guard for object-graph hydration.
//!
//! When loading record A requires loading B, and loading B would require
//! loading A again, the nested attempt finds A already in flight on this
//! thread and builds a partial A instead of recursing. Recursion depth is
//! therefore bounded by the cycle length.

use boxoffice_types::EntityKey;
use dashmap::DashMap;
use std::collections::HashSet;
use std::thread::{self, ThreadId};

/// Keys currently being hydrated, tracked separately for each thread.
///
/// A key marked on one thread is invisible to every other thread.
#[derive(Debug, Default)]
pub struct LoadingContext {
    in_flight: DashMap<ThreadId, HashSet<EntityKey>>,
}

impl LoadingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` is being hydrated further up the current thread's stack.
    pub fn is_loading(&self, key: &EntityKey) -> bool {
        self.in_flight
            .get(&thread::current().id())
            .is_some_and(|keys| keys.contains(key))
    }

    /// Marks `key` as in flight. Returns false if it already was.
    pub fn start_loading(&self, key: &EntityKey) -> bool {
        self.in_flight
            .entry(thread::current().id())
            .or_default()
            .insert(key.clone())
    }

    /// Clears the in-flight mark for `key`. Idempotent.
    pub fn finish_loading(&self, key: &EntityKey) {
        let tid = thread::current().id();
        if let Some(mut keys) = self.in_flight.get_mut(&tid) {
            keys.remove(key);
        }
        self.in_flight.remove_if(&tid, |_, keys| keys.is_empty());
    }

    /// Marks `key` as in flight for the lifetime of the returned guard.
    ///
    /// Returns `None` if the key is already in flight on this thread; the
    /// caller should then build a partial object. The mark is cleared when
    /// the guard drops, including during unwinding.
    pub fn enter(&self, key: &EntityKey) -> Option<LoadingGuard<'_>> {
        if !self.start_loading(key) {
            return None;
        }
        Some(LoadingGuard {
            context: self,
            key: key.clone(),
        })
    }

    /// Number of keys in flight on the current thread.
    pub fn depth(&self) -> usize {
        self.in_flight
            .get(&thread::current().id())
            .map_or(0, |keys| keys.len())
    }
}

/// Scope of one hydration call. Clears its key on drop.
#[must_use = "the key is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    context: &'a LoadingContext,
    key: EntityKey,
}

impl LoadingGuard<'_> {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.context.finish_loading(&self.key);
    }
}
