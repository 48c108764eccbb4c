//! Record model for the box office persistence layer.
//!
//! Defines what the stores and the replication engine move around:
//! - [`Record`]: the opaque replicated payload (type, identity, JSON data, timestamps)
//! - [`EntitySchema`]: an entity type's identity strategy and stored references
//! - [`Catalog`]: the registered entity types and their bootstrap order
//!
//! The booking rules themselves are not here; records are treated as opaque
//! payloads that are copied, not interpreted.

mod catalog;
mod record;
mod schema;

pub use catalog::{types, Catalog};
pub use record::{now_millis, Record};
pub use schema::{EntitySchema, IdStrategy, Reference};
