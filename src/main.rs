// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Löyly - interactive sauna installation backend
//!
//! Runs the housekeeping loop that turns sauna sensor readings into game
//! scene events, and serves the HTTP API the browser frontend polls.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use loyly::{
    api::{self, AppState},
    config::SourceKind,
    core::EngineSettings,
    sensors::{HarviaClient, RandomSensor},
    Config, Database, Housekeeping, Scheduler, SceneRegistry, SensorManager, NAME, VERSION,
};

/// Löyly - interactive sauna installation backend
#[derive(Parser, Debug)]
#[command(name = "loyly")]
#[command(version = VERSION)]
#[command(about = "Sauna sensor housekeeping and game scene backend")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Housekeeping tick period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Sensor source: random, sequential, http or harvia
    #[arg(long)]
    source: Option<SourceKind>,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Start with housekeeping disabled
    #[arg(long)]
    disabled: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    config.apply_env_overrides();

    // Override with command line args
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.housekeeping.interval_ms = interval_ms;
    }
    if let Some(source) = args.source {
        config.housekeeping.source = source;
    }
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if args.disabled {
        config.housekeeping.enabled = false;
    }

    // Initialize logging
    let configured_level = config.log_level.parse::<Level>();
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        configured_level.as_ref().copied().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🧖 {} v{}", NAME, VERSION);
    info!("Configuration loaded from {:?}", config_path);
    if let Err(e) = configured_level {
        warn!("Invalid log_level {:?}, using info: {}", config.log_level, e);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<()> {
    // The loop never starts without storage.
    let db = Arc::new(Database::open(&config.database).context("Failed to open database")?);

    let harvia = HarviaClient::new(&config.harvia)?;
    if !harvia.is_configured() {
        info!("HARVIA_API_KEY not set, /api/harvia/data will report errors");
    }

    let sensors = Arc::new(SensorManager::from_config(&config, &harvia)?);

    let engine = Arc::new(Housekeeping::new(
        sensors.clone(),
        db.clone(),
        SceneRegistry::standard(&config.scenes),
        EngineSettings::from(&config.housekeeping),
    ));
    info!(
        "Housekeeping {} (every {} ms)",
        if config.housekeeping.enabled { "enabled" } else { "disabled" },
        config.housekeeping.interval_ms
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let scheduler = Scheduler::new(engine.clone(), config.housekeeping.skip_if_busy)
        .spawn(shutdown_tx.subscribe());

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    let state = AppState {
        engine,
        db,
        sensors,
        harvia,
        mock: Arc::new(RandomSensor::new()),
    };

    let mut server_shutdown = shutdown_tx.subscribe();
    let served = api::serve(&config.server, state, async move {
        let _ = server_shutdown.recv().await;
    })
    .await;

    if let Err(e) = &served {
        error!("HTTP server failed: {}", e);
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = scheduler.await {
        warn!("Housekeeping loop ended abnormally: {}", e);
    }

    info!("{} shutdown complete", NAME);
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
