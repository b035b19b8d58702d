// ABOUTME: Entry point for the taskd binary.
// ABOUTME: Parses CLI arguments, initializes tracing, opens the database, and starts the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use taskd_server::{AppState, TaskdConfig, create_router};
use taskd_store::Database;

/// Task tracking service backed by a write-through JSON file.
#[derive(Debug, Parser)]
#[command(name = "taskd", version, about)]
struct Cli {
    /// Address to listen on (overrides TASKD_BIND).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Database file (overrides TASKD_DB_PATH).
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskd=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = TaskdConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    tracing::info!("taskd starting up");

    // The load must finish before the router exists, or early writes would be
    // overwritten by the file contents.
    let db = Database::open(&config.db_path, config.database_options())
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let app = create_router(Arc::new(AppState::new(db)));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("taskd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
