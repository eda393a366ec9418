//! Input guard service.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────┐
//!                   │                 INPUT GUARD                   │
//!   Client Request  │  ┌──────────┐   ┌────────────┐   ┌──────────┐ │
//!   ────────────────┼─▶│ request  │──▶│ rate limit │──▶│  CSRF /  │ │
//!                   │  │ id/trace │   │  (window)  │   │   XSS    │ │
//!                   │  └──────────┘   └────────────┘   └────┬─────┘ │
//!                   │                                       ▼       │
//!   Client Response │  ┌──────────┐                   ┌──────────┐  │
//!   ◀───────────────┼──│ security │◀──────────────────│ handlers │  │
//!                   │  │ headers  │                   │ (guard)  │  │
//!                   │  └──────────┘                   └──────────┘  │
//!                   │                                               │
//!                   │  config (TOML + hot reload) · observability   │
//!                   │  lifecycle (signals, graceful shutdown)       │
//!                   └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use input_guard::config::{load_config, watcher::ConfigWatcher, GuardConfig};
use input_guard::http::HttpServer;
use input_guard::lifecycle::{signals::wait_for_shutdown_signal, Shutdown};
use input_guard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "input-guard")]
#[command(about = "HTTP service validating and sanitizing untrusted input", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(Some(&config.observability.log_level));
    tracing::info!("input-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        csrf_enabled = config.csrf.enabled,
        "Configuration loaded"
    );
    if config.rate_limit.sweep_interval_secs.is_none() {
        tracing::warn!("Rate-limit sweeping disabled; the record store grows with distinct clients");
    }
    if config.csrf.sweep_interval_secs.is_none() {
        tracing::warn!("CSRF token sweeping disabled; the token store grows with sessions");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher handle alive for the life of the process.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    wait_for_shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
