//! SQLite Viewer launcher
//!
//! Serves a SQLite database file in the browser:
//!
//! ```bash
//! # Serve on an OS-assigned port
//! sqlite-viewer ./database/database.sqlite
//!
//! # Serve on a fixed port
//! sqlite-viewer ./database/database.sqlite --port 8000
//! SQLITE_VIEWER_PORT=8000 sqlite-viewer ./database/database.sqlite
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sqlite_viewer::ViewerLayer;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod database;

/// Browse a SQLite database file in the browser
#[derive(Parser, Debug)]
#[command(name = "sqlite-viewer", version, about)]
struct Args {
    /// Path to the SQLite database file
    #[arg(value_name = "DATABASE", env = "SQLITE_VIEWER_DATABASE")]
    database: Option<PathBuf>,

    /// Port to listen on (default: any free port)
    #[arg(short = 'p', long, env = "SQLITE_VIEWER_PORT")]
    port: Option<u16>,

    /// Host address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SQLITE_VIEWER_HOST")]
    host: String,

    /// Milliseconds a query waits on another process's lock before failing
    #[arg(long, value_name = "MS", default_value_t = database::DEFAULT_BUSY_TIMEOUT_MS, env = "SQLITE_VIEWER_BUSY_TIMEOUT")]
    busy_timeout: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "SQLITE_VIEWER_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let Some(database_path) = args.database.clone() else {
        eprintln!("Error: Please provide the path to the SQLite database as an argument.");
        eprintln!("Usage: sqlite-viewer ./database/database.sqlite");
        std::process::exit(1);
    };

    init_logging(&args.log_level);

    let pool = database::open(&database_path, Duration::from_millis(args.busy_timeout)).await?;

    let app = ViewerLayer::sqlite("/", pool).into_router();

    let port = args.port.unwrap_or(0);
    let listener = TcpListener::bind((args.host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind to {} port {}", args.host, port))?;
    let local_address: SocketAddr = listener.local_addr()?;

    info!(database = %database_path.display(), "serving database");
    println!("SQLite Viewer running at http://{}", local_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(format!(
        "sqlite_viewer={level},sqlite_viewer_cli={level},tower_http={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
