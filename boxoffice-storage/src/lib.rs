//! Storage layer for the box office application.
//!
//! Provides the pieces every store shares, plus the stores themselves.
//!
//! # Architecture
//!
//! - A [`StoreBackend`] persists records in one physical store: SQLite
//!   ([`RelationalBackend`]), one CSV file per type ([`FlatFileBackend`]) or
//!   process memory ([`MemoryBackend`]).
//! - An [`Accessor`] wraps a backend for one entity type. It reads through
//!   the process-wide [`GlobalCache`], keeps that cache coherent on every
//!   write, and notifies its [`MutationObserver`]s after each commit.
//! - A [`DataStore`] groups one accessor per catalog entity type.
//! - A [`LoadingContext`] breaks reference cycles while hydrating object
//!   graphs that span several accessors.
//!
//! The cache and loading context are constructed once by the application
//! and handed to every store, rather than living in statics.

mod accessor;
pub mod backend;
mod cache;
mod error;
mod loading;
mod observer;
mod store;

pub use accessor::Accessor;
pub use backend::{
    BackendKind, FlatFileBackend, MemoryBackend, RelationalBackend, StoreBackend, UpsertOutcome,
};
pub use cache::GlobalCache;
pub use error::{StorageError, StorageResult};
pub use loading::{LoadingContext, LoadingGuard};
pub use observer::{
    Delivery, MutationObserver, ObserverError, ObserverRegistry, ObserverResult, RecordEvent,
};
pub use store::DataStore;
