//! Startup orchestration.
//!
//! # Order
//! - Load and validate configuration
//! - Initialize logging, then metrics
//! - Construct the engine
//! - Bind the listener and serve until a shutdown signal
//!
//! Any startup error is fatal.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;

use crate::config::{load_config, ConfigError};
use crate::engine::{EngineError, EngineSettings, RemoteEngine};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::elastic::ElasticLayer;
use crate::observability::{logging, metrics};

/// Command line of the server binary.
#[derive(Debug, Parser)]
#[command(name = "jes-http")]
#[command(about = "HTTP server for JSON Event Sourcing", version)]
pub struct Cli {
    /// TCP port to listen on.
    pub port: u16,

    /// Configuration file.
    #[arg(short, long, default_value = "conf/application.toml")]
    pub config: PathBuf,
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] TryInitError),

    #[error("metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the server and run it until shutdown.
pub async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = load_config(&cli.config)?;

    let level = logging::parse_level(&config.log_level).unwrap_or(LevelFilter::INFO);
    let elastic = config
        .elastic_log
        .as_ref()
        .map(|elastic| ElasticLayer::spawn(elastic, level, &config.environment));
    logging::init(level, elastic)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        context_path = %config.context_path,
        config = %cli.config.display(),
        "jes-http starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr)?;
        }
    }

    let engine = RemoteEngine::new(EngineSettings::from_config(&config))?;

    let listener = TcpListener::bind((config.listener.host.as_str(), cli.port)).await?;
    let local_addr = listener.local_addr()?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        shutdown.trigger();
    });

    tracing::info!(address = %local_addr, "Ready");
    HttpServer::new(config, Arc::new(engine))
        .run(listener, server_shutdown)
        .await?;
    tracing::info!("Done");

    Ok(())
}
