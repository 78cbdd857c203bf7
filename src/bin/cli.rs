//! sheetsync CLI
//!
//! Serves the API with a background sync, or runs single operations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sheetsync::{
    api::{self, AppState},
    config,
    error::Result,
    models::{Config, SyncStatus},
    pipeline::{FileSheetSource, HttpSheetSource, Scheduler, SheetSource, SyncGuard, SyncJob},
    services::Aggregator,
    storage,
    utils::url::source_url,
};

/// sheetsync - Google Sheets mirror and department API
#[derive(Parser, Debug)]
#[command(
    name = "sheetsync",
    version,
    about = "Mirror a Google Sheets export and serve department views"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API with periodic background syncs
    Serve {
        /// Do not sync in the background
        #[arg(long)]
        no_sync: bool,
    },

    /// Run one sync and exit
    Sync {
        /// Read the CSV from a local file instead of the configured source
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Validate the configuration
    Validate,

    /// Show store statistics
    Info,
}

/// Initialize logging. `RUST_LOG` wins over `level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    log::info!("Shutdown requested");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    init_logging(&level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });
    config::apply_env(&mut config)?;

    match cli.command {
        Command::Serve { no_sync } => {
            if no_sync {
                config.sync.enabled = false;
            }
            config.validate()?;
            serve(config).await?;
        }

        Command::Sync { from_file } => {
            let source: Arc<dyn SheetSource> = match from_file {
                Some(path) => Arc::new(FileSheetSource::new(path)),
                None => Arc::new(HttpSheetSource::from_config(&config.source)?),
            };
            let store = storage::open(&config.storage).await?;
            let job = SyncJob::new(
                source,
                store,
                SyncGuard::with_max_drop(config.sync.max_drop_percent),
                SyncStatus::new(),
            );

            let report = job.run().await?;
            log::info!(
                "Sync {:?}: {} records parsed, generation {}",
                report.outcome,
                report.record_count,
                report
                    .generation
                    .map_or_else(|| "unchanged".to_string(), |g| g.to_string())
            );
            log::info!("Source digest: {}", report.digest);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.source.is_configured() {
                log::info!("✓ Source: {}", source_url(&config.source)?);
            } else {
                log::info!("✓ No source configured (sync disabled)");
            }
            log::info!("✓ Listen address: {}", config.server.bind_addr());

            log::info!("All validations passed!");
        }

        Command::Info => {
            let store = storage::open(&config.storage).await?;
            let stats = store.stats().await?;
            log::info!("Collection: {}", config.storage.collection);
            log::info!("Documents: {}", stats.count);
            log::info!("Generation: {}", stats.generation);
            match stats.updated_at {
                Some(updated) => log::info!("Last updated: {}", updated.to_rfc3339()),
                None => log::info!("No data synced yet."),
            }
        }
    }

    Ok(())
}

/// Open the store, start the scheduler and serve until Ctrl-C.
async fn serve(config: Config) -> Result<()> {
    let store = storage::open(&config.storage).await?;
    let status = SyncStatus::new();

    let job = if config.source.is_configured() {
        Some(Arc::new(SyncJob::from_config(
            &config,
            Arc::clone(&store),
            status.clone(),
        )?))
    } else {
        log::warn!("No sheet source configured; serving stored data only");
        None
    };

    let scheduler = match &job {
        Some(job) if config.sync.enabled => Some(Scheduler::spawn(
            Arc::clone(job),
            Duration::from_secs(config.sync.interval_secs),
            config.sync.run_on_startup,
        )),
        _ => None,
    };

    let aggregator = Aggregator::new(store, status, config.storage.collection.clone());
    let app = api::router(AppState::new(aggregator, job), &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    log::info!("Done!");
    Ok(())
}
