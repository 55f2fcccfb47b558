//! cvc-so (Service Order) - order of worship editing service
//!
//! Serves the pastor's order-of-worship editor and the song/reading entry
//! views over JSON HTTP. Settings come from the command line, environment,
//! `cvc-so.toml` and compiled defaults, in that order.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvc_common::config::{CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig};
use cvc_common::db::init_database;
use cvc_so::{build_router, AppState};

const MODULE_NAME: &str = "cvc-so";

/// Command-line arguments for cvc-so
#[derive(Parser, Debug)]
#[command(name = "cvc-so")]
#[command(about = "Order of worship service for church volunteer coordination")]
#[command(version)]
struct Args {
    /// Root folder holding the database (overrides CVC_ROOT_FOLDER / CVC_ROOT)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CVC_SO_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "CVC_SO_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new(MODULE_NAME).with_cli_arg(args.root_folder.clone());
    let config = resolver.load_config().unwrap_or_default();
    let defaults = CompiledDefaults::for_current_platform();

    init_tracing(&config)?;

    // Build identification goes out before any database work
    info!(
        "Starting CVC Service Order (cvc-so) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolver.resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let draft_delay = Duration::from_millis(
        config
            .draft_debounce_ms
            .unwrap_or(defaults.draft_debounce_ms),
    );
    info!("Draft autosave delay: {}ms", draft_delay.as_millis());

    let app = build_router(AppState::new(pool, draft_delay));

    let host = args
        .host
        .or(config.server.host)
        .unwrap_or(defaults.host);
    let port = args.port.or(config.server.port).unwrap_or(defaults.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("cvc-so listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// RUST_LOG wins over the config file level; a configured log file gets a
/// second, colorless copy of the output
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},tower_http=info", config.logging.level)))
        .context("Invalid log level")?;

    let file_layer = match &config.logging.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
