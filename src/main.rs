//! UI control plane server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Editing surfaces / uicp-cli           Client applications
//!              │                                   │
//!              ▼                                   ▼
//!     ┌────────────────┐                 ┌──────────────────┐
//!     │   /admin/*     │                 │ /v1/config/{env} │
//!     │                │                 │ /v1/preview/{c}  │
//!     └───────┬────────┘                 └────────┬─────────┘
//!             │            ConfigService           │
//!             └──────────────────┬─────────────────┘
//!                 ┌──────────────┼───────────────┐
//!                 ▼              ▼               ▼
//!          ┌────────────┐ ┌─────────────┐ ┌──────────────┐
//!          │ ConfigStore│ │  Preview    │ │   Publish    │
//!          │ + validator│ │  sessions   │ │   pointers   │
//!          └─────┬──────┘ └─────────────┘ └──────┬───────┘
//!                └────────── snapshot ───────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use ui_control_plane::config::{load_config, ConfigWatcher, ServiceConfig};
use ui_control_plane::http::HttpServer;
use ui_control_plane::lifecycle::{bootstrap, spawn_signal_handler, Shutdown};
use ui_control_plane::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "ui-control-plane", version, about = "UI configuration control plane")]
struct Args {
    /// Path to the TOML settings file. Defaults apply when omitted.
    #[arg(short, long, env = "UICP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ui-control-plane starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        snapshot = ?config.storage.snapshot_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = bootstrap(&config)?;

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => start_watcher(path),
        None => (None, tokio::sync::mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, service);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn start_watcher(
    path: &Path,
) -> (
    Option<notify::RecommendedWatcher>,
    tokio::sync::mpsc::UnboundedReceiver<ServiceConfig>,
) {
    let (watcher, updates) = ConfigWatcher::new(path);
    match watcher.run() {
        Ok(handle) => (Some(handle), updates),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable; hot reload disabled");
            (None, updates)
        }
    }
}
