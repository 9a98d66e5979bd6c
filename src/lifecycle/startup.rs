//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Resolve every referenced address, once
//! - Build the path metrics and the collector
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - No upstream call happens before the configuration is valid
//! - The listener binds last (scrapes only once the collector is ready)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::collector::{build_path_metrics, Collector};
use crate::config::{load_config, validate_config, ConfigError, ExporterConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::MetricsRegistry;
use crate::waze::{resolve_addresses, ResolveError, Upstream, WazeClient, WazeError};

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot build upstream client: {0}")]
    Client(#[source] WazeError),

    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("invalid listen address: {0}")]
    Listen(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interrupted during startup")]
    Interrupted,
}

/// Resolve addresses and build the collector for a loaded configuration.
pub async fn build_collector(
    config: &ExporterConfig,
    registry: &MetricsRegistry,
    shutdown: Shutdown,
) -> Result<Collector<WazeClient>, StartupError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let upstream = Upstream::parse(&config.base_url)?;
    let client = WazeClient::new(upstream.clone(), Duration::from_secs(config.timeout_secs))
        .map_err(StartupError::Client)?;

    let names = config
        .paths
        .iter()
        .flat_map(|path| [path.from.as_str(), path.to.as_str()]);
    let resolved = resolve_addresses(&client, &config.addresses, names, config.region).await?;

    let paths = build_path_metrics(config, &resolved, &upstream, registry)
        .map_err(|e| ConfigError::Validation(vec![e]))?;
    let collector = Collector::new(
        client,
        paths,
        Duration::from_millis(config.sleep),
        registry,
        shutdown,
    );
    tracing::info!(
        addresses = resolved.len(),
        path_metrics = collector.paths().len(),
        sleep_ms = collector.delay().as_millis() as u64,
        "Collector ready"
    );

    Ok(collector)
}

/// Full process lifecycle: load, resolve, serve until SIGINT/SIGTERM.
pub async fn run(config_path: &Path) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    let listen = config.listen_addr()?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let registry = Arc::new(MetricsRegistry::new());
    let collector = tokio::select! {
        collector = build_collector(&config, &registry, shutdown.clone()) => collector?,
        _ = shutdown.wait() => return Err(StartupError::Interrupted),
    };

    let listener = TcpListener::bind(listen).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for scrapes");

    HttpServer::new(Arc::new(collector), registry)
        .run(listener, shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
