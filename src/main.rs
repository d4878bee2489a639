//! Tankwatch - tank current control and water-quality service
//!
//! # Usage
//!
//! ```bash
//! # Durable sled storage under ./data
//! cargo run --release
//!
//! # Ephemeral in-memory storage on another port
//! cargo run --release -- --memory --addr 127.0.0.1:9000
//! ```
//!
//! # Environment Variables
//!
//! - `TANKWATCH_CONFIG`: Path to the TOML config file
//! - `TANKWATCH_SERVER_ADDR`: Override the HTTP bind address
//! - `TANKWATCH_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the sled database on startup

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tankwatch::api::{create_app, ApiState};
use tankwatch::config::{self, StorageBackend, TankwatchConfig};
use tankwatch::control::{TankControlEvaluator, TokioTimer};
use tankwatch::storage::open_repository;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tankwatch")]
#[command(about = "Tank current control and water-quality health service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long, env = "TANKWATCH_SERVER_ADDR")]
    addr: Option<String>,

    /// Path to a TOML config file (default: $TANKWATCH_CONFIG or ./tankwatch.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep all records in memory; nothing survives a restart
    #[arg(long)]
    memory: bool,

    /// Wipe the sled database on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,
}

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Remove the sled database directory and all its contents.
fn reset_database(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "Database does not exist, nothing to reset");
        return Ok(());
    }

    warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    warn!("  RESET_DB DETECTED - WIPING ALL PERSISTENT DATA");
    warn!("  Removing: {}", path.display());
    warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove database at {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut tank_config =
        TankwatchConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(addr) = args.addr {
        tank_config.server.addr = addr;
    }
    if args.memory {
        tank_config.storage.backend = StorageBackend::Memory;
    }
    tank_config
        .validate()
        .context("Invalid configuration after CLI overrides")?;
    config::init(tank_config);
    let cfg = config::get();

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Tankwatch - Tank Current Control & Water Quality");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Reset DB check, before the repository is opened
    if cfg.storage.backend == StorageBackend::Sled && should_reset_db(args.reset_db) {
        reset_database(&cfg.storage.path)?;
    }

    let repository = open_repository(&cfg.storage).context("Failed to open storage")?;
    let timer = Arc::new(TokioTimer::new());
    let evaluator = Arc::new(TankControlEvaluator::new(repository, timer));
    let app = create_app(ApiState::new(Arc::clone(&evaluator), cfg.health.clone()));

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;
    info!("HTTP server listening on {}", cfg.server.addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("HTTP server received shutdown signal");
        })
        .await;
    if let Err(e) = &served {
        error!("HTTP server error: {}", e);
    }

    // No current reset may fire once we report shutdown complete.
    evaluator.shutdown().await;

    served.context("HTTP server failed")?;
    info!("Tankwatch shutdown complete");
    Ok(())
}
