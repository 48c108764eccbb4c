//! Post-commit observer fan-out shared by every accessor.
//!
//! Accessors own an [`ObserverRegistry`] and call
//! [`ObserverRegistry::notify`] exactly once per committed write. Delivery
//! iterates a snapshot of the registered observers, so a handler may add or
//! remove observers, or perform further writes, without disturbing the
//! delivery in progress.

use boxoffice_model::Record;
use boxoffice_types::MutationEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, warn};

/// A mutation event carrying the committed record.
pub type RecordEvent = MutationEvent<Record>;

/// Error type observers report back to the fan-out loop.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Result of one observer invocation.
pub type ObserverResult = Result<(), ObserverError>;

/// Receives committed mutations from an accessor.
///
/// Called synchronously on the writer's thread, after the local commit.
/// Errors are logged by the registry and never reach the writer.
pub trait MutationObserver: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str {
        "observer"
    }

    fn on_mutation(&self, event: &RecordEvent) -> ObserverResult;
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

/// The set of observers registered on one accessor.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn MutationObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer. Returns false if it was already registered.
    pub fn add(&self, observer: Arc<dyn MutationObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        if observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            return false;
        }
        observers.push(observer);
        true
    }

    /// Unregisters an observer. Returns false if it was not registered.
    pub fn remove(&self, observer: &Arc<dyn MutationObserver>) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current observer list.
    pub fn snapshot(&self) -> Vec<Arc<dyn MutationObserver>> {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Delivers `event` to every observer registered when the call began.
    ///
    /// Each invocation runs inside its own failure boundary: an error or a
    /// panic from one observer is logged and the remaining observers still
    /// receive the event.
    pub fn notify(&self, event: &RecordEvent) -> Delivery {
        let mut delivery = Delivery::default();

        for observer in self.snapshot() {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.on_mutation(event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    delivery.failed += 1;
                    warn!(
                        "Observer {} failed on {} {}#{}: {}",
                        observer.name(),
                        event.op,
                        event.entity_type,
                        event.id,
                        e
                    );
                }
                Err(_) => {
                    delivery.failed += 1;
                    error!(
                        "Observer {} panicked on {} {}#{}",
                        observer.name(),
                        event.op,
                        event.entity_type,
                        event.id
                    );
                }
            }
        }

        delivery
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}
