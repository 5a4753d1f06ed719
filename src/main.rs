//! LXD discovery provider (v1)
//!
//! Watches an LXD daemon and publishes routing configuration for its
//! running instances, derived from `user.traefik.*` config keys.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                       LXD PROVIDER                           │
//!   │                                                              │
//!   │  ┌────────────┐  list   ┌────────────┐  labels ┌──────────┐  │
//!   │  │ supervisor │───────▶ │ lxd client │ ──────▶ │  label   │  │      LXD
//!   │  │  (backoff) │ ◀─────  │ unix sock  │ ◀────── │ decoder  │  │◀──── daemon
//!   │  └─────┬──────┘ records └────────────┘         └──────────┘  │
//!   │        │ Message                                             │
//!   │        ▼                                                     │
//!   │  ┌────────────┐         ┌────────────┐                       │
//!   │  │  channel   │───────▶ │ snapshot   │◀──── GET /api/*  ─────┼──── provider-cli
//!   │  │  (mpsc)    │         │ store+API  │                       │
//!   │  └────────────┘         └────────────┘                       │
//!   │                                                              │
//!   │  config · observability · lifecycle (signals, shutdown)      │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lxd_provider::api::{self, ApiState, SnapshotStore};
use lxd_provider::config::{load_config, validation::validate_config, ConfigError, ProviderConfig};
use lxd_provider::lifecycle::{signals, Shutdown};
use lxd_provider::observability::{logging, metrics};
use lxd_provider::provider::LxdProvider;

#[derive(Parser)]
#[command(name = "lxd-provider", version)]
#[command(about = "Publishes routing configuration for running LXD instances", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LXD endpoint, e.g. unix:///var/snap/lxd/common/lxd/unix.socket
    #[arg(long)]
    endpoint: Option<String>,

    /// Expose instances without an explicit enable label
    #[arg(long)]
    exposed_by_default: Option<bool>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_config(args: &Args) -> Result<ProviderConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProviderConfig::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(exposed) = args.exposed_by_default {
        config.provider.exposed_by_default = exposed;
    }
    if let Some(level) = &args.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init_logging(&config.observability);
    tracing::info!("lxd-provider v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        endpoint = %config.provider.endpoint,
        exposed_by_default = config.provider.exposed_by_default,
        poll_interval_secs = config.provider.poll_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let provider = LxdProvider::new(config.provider.clone(), config.backoff.clone())?;

    let shutdown = Shutdown::new();
    let store = Arc::new(SnapshotStore::new());
    let (tx, rx) = mpsc::channel(config.provider.channel_capacity);
    let consumer = tokio::spawn(api::consume(rx, store.clone()));

    let api_server = if config.api.enabled {
        let listener = TcpListener::bind(&config.api.bind_address).await?;
        let state = ApiState::new(store.clone(), &config.api.api_key);
        Some(tokio::spawn(api::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    let supervisor = provider.provide(tx, shutdown.subscribe());

    signals::shutdown_on_signal(&shutdown).await;

    supervisor.await?;
    consumer.await?;
    if let Some(server) = api_server {
        server.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
