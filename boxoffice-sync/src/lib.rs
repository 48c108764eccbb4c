//! Cross-store replication for the box office.
//!
//! Keeps a relational store and a flat-file store consistent while the
//! application writes to one of them.
//!
//! # Components
//!
//! - [`SyncContext`]: per-thread guard marking an active replication pass.
//! - [`CrossPersistenceObserver`]: replays each committed write on the other
//!   store under the same identity.
//! - [`InitialSyncManager`]: at startup, wipes the secondary store and
//!   copies the primary into it in dependency order.
//! - [`Replicator`]: registers and unregisters the observers.
//!
//! # Startup sequence
//!
//! 1. Open both stores over one shared cache.
//! 2. `InitialSyncManager::perform_initial_sync(primary)`.
//! 3. `Replicator::arm(primary, secondary, sync, bidirectional)`.
//!
//! Replication is synchronous and best effort. A write returns after its
//! replay on the other store has been attempted, and a failed replay is
//! logged rather than reported to the writer.

mod error;
mod initial_sync;
mod observer;
mod replicator;
mod sync_context;

pub use error::{SyncError, SyncResult};
pub use initial_sync::{BootstrapReport, InitialSyncManager};
pub use observer::{CrossPersistenceObserver, ReplicationCounts, ReplicationStats};
pub use replicator::Replicator;
pub use sync_context::{SyncContext, SyncGuard};
