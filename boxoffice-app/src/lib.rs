//! Box office application layer.
//!
//! Wires the storage and sync crates together: configuration, startup
//! bootstrap, the login session and venue graph hydration.

mod app;
pub mod config;
mod error;
pub mod graph;
mod session;

pub use app::App;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use graph::{Venue, VenueGraph, VenueManager};
pub use session::Session;
