//! Box office store bootstrap.
//!
//! Opens the relational and flat-file stores, makes the secondary a copy of
//! the primary and arms replication between them.
//!
//! Usage:
//!   boxoffice --data-dir ./data --primary relational

use anyhow::{Context, Result};
use boxoffice_app::{App, AppConfig};
use boxoffice_storage::BackendKind;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "boxoffice")]
#[command(about = "Align the box office stores and arm replication")]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding both stores
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Source of truth for this run (relational | flat-file)
    #[arg(short, long)]
    primary: Option<BackendKind>,

    /// Do not wipe and repopulate the secondary store
    #[arg(long)]
    skip_initial_sync: bool,

    /// Also replicate writes made to the secondary store
    #[arg(long)]
    bidirectional: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(primary) = self.primary {
            config.primary = primary;
        }
        if self.skip_initial_sync {
            config.initial_sync = false;
        }
        if self.bidirectional {
            config.bidirectional = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Box office starting...");
    let config = args.into_config()?;
    let app = App::start(config).context("Failed to start the box office stores")?;
    let (primary, secondary) = app.record_counts().context("Failed to count records")?;

    println!("\n========================================");
    println!("  Box Office Stores Ready");
    println!("========================================");
    println!("  Data dir:   {}", app.config().data_dir.display());
    println!("  Primary:    {} ({} records)", app.primary().kind(), primary);
    println!("  Secondary:  {} ({} records)", app.secondary().kind(), secondary);
    if let Some(report) = app.bootstrap_report() {
        match &report.error {
            None => println!("  Bootstrap:  {} records copied", report.total_copied()),
            Some(e) => println!("  Bootstrap:  FAILED ({e})"),
        }
    }
    println!(
        "  Replication: {}",
        if app.config().bidirectional { "both directions" } else { "primary -> secondary" }
    );
    println!("========================================\n");

    app.shutdown();
    Ok(())
}
