//! Application startup: open both stores, align them, arm replication.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::graph::VenueGraph;
use crate::session::Session;
use boxoffice_model::Catalog;
use boxoffice_model::types::USER;
use boxoffice_storage::{BackendKind, DataStore, GlobalCache, LoadingContext};
use boxoffice_sync::{BootstrapReport, InitialSyncManager, ReplicationCounts, Replicator, SyncContext};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

/// A running application: both stores plus the shared engine state.
pub struct App {
    config: AppConfig,
    cache: Arc<GlobalCache>,
    loading: Arc<LoadingContext>,
    sync: Arc<SyncContext>,
    relational: Arc<DataStore>,
    flat_file: Arc<DataStore>,
    bootstrap: Option<BootstrapReport>,
    replicator: Option<Replicator>,
}

impl App {
    /// Opens both stores under `config.data_dir`, runs the initial sync if
    /// enabled and arms replication from the primary store.
    pub fn start(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let catalog = Catalog::booking();
        let cache = Arc::new(GlobalCache::new());
        let relational = Arc::new(DataStore::open_relational(
            &config.database_path(),
            &catalog,
            cache.clone(),
        )?);
        let flat_file = Arc::new(DataStore::open_flat_file(
            config.flat_file_path(),
            &catalog,
            cache.clone(),
        )?);

        let mut app = Self {
            config,
            cache,
            loading: Arc::new(LoadingContext::new()),
            sync: Arc::new(SyncContext::new()),
            relational,
            flat_file,
            bootstrap: None,
            replicator: None,
        };

        if app.config.initial_sync {
            let manager = InitialSyncManager::new(
                app.relational.clone(),
                app.flat_file.clone(),
                app.sync.clone(),
            );
            let report = manager.perform_initial_sync(app.config.primary);
            if let Some(e) = &report.error {
                warn!("Starting with {} as the only authoritative store: {}", app.config.primary, e);
            }
            app.bootstrap = Some(report);
        } else {
            info!("Initial sync skipped");
        }

        app.replicator = Some(Replicator::arm(
            app.primary(),
            app.secondary(),
            app.sync.clone(),
            app.config.bidirectional,
        ));
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn primary_kind(&self) -> BackendKind {
        self.config.primary
    }

    /// The store application writes go to.
    pub fn primary(&self) -> &Arc<DataStore> {
        match self.config.primary {
            BackendKind::FlatFile => &self.flat_file,
            _ => &self.relational,
        }
    }

    pub fn secondary(&self) -> &Arc<DataStore> {
        match self.config.primary {
            BackendKind::FlatFile => &self.relational,
            _ => &self.flat_file,
        }
    }

    pub fn cache(&self) -> &Arc<GlobalCache> {
        &self.cache
    }

    pub fn sync_context(&self) -> &Arc<SyncContext> {
        &self.sync
    }

    pub fn bootstrap_report(&self) -> Option<&BootstrapReport> {
        self.bootstrap.as_ref()
    }

    pub fn replication_stats(&self) -> ReplicationCounts {
        self.replicator
            .as_ref()
            .map(Replicator::stats)
            .unwrap_or_default()
    }

    pub fn session(&self) -> AppResult<Session> {
        Ok(Session::new(self.primary().require(USER)?.clone(), self.cache.clone()))
    }

    pub fn venue_graph(&self) -> VenueGraph {
        VenueGraph::new(self.primary().clone(), self.loading.clone())
    }

    /// Record totals as `(primary, secondary)`.
    pub fn record_counts(&self) -> AppResult<(usize, usize)> {
        Ok((self.primary().total_records()?, self.secondary().total_records()?))
    }

    /// Disarms replication. The stores close when the last handle drops.
    pub fn shutdown(mut self) {
        if let Some(replicator) = self.replicator.take() {
            replicator.disarm();
        }
        info!("Box office shut down");
    }
}
