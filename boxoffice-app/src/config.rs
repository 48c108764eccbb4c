//! Application configuration.
//!
//! Read from an optional JSON file; missing fields take their defaults and
//! command-line flags override both.

use crate::error::{AppError, AppResult};
use boxoffice_storage::BackendKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding both stores.
    pub data_dir: PathBuf,
    /// SQLite file name, relative to `data_dir`.
    pub database_file: String,
    /// CSV directory name, relative to `data_dir`.
    pub flat_file_dir: String,
    /// Store treated as the source of truth for this run.
    pub primary: BackendKind,
    /// Wipe and repopulate the secondary store at startup.
    pub initial_sync: bool,
    /// Also replicate writes made directly to the secondary store.
    pub bidirectional: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_file: "boxoffice.db".to_string(),
            flat_file_dir: "csv".to_string(),
            primary: BackendKind::Relational,
            initial_sync: true,
            bidirectional: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.primary == BackendKind::Memory {
            return Err(AppError::Config(
                "primary must be relational or flat_file".to_string(),
            ));
        }
        if self.database_file.is_empty() || self.flat_file_dir.is_empty() {
            return Err(AppError::Config("store locations must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn flat_file_path(&self) -> PathBuf {
        self.data_dir.join(&self.flat_file_dir)
    }
}
