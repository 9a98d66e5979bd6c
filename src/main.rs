//! Waze Travel-Time Exporter
//!
//! Serves Prometheus metrics built from Waze routing queries.
//!
//! # Architecture Overview
//!
//! ```text
//!   Prometheus scrape
//!   ────────────────▶ http::server ──▶ collector ──▶ waze::client ──▶ Waze
//!                         │                │
//!                         ◀── render ── observability::metrics (gauges, counters)
//!
//!   startup: config::loader → waze::geocode (addresses) → collector::path (queries)
//! ```

use std::path::PathBuf;

use clap::Parser;

use waze_exporter::lifecycle::startup;
use waze_exporter::observability::logging;

#[derive(Parser)]
#[command(name = "waze-exporter")]
#[command(about = "Prometheus exporter for Waze travel times", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    config_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logging::init_tracing();
    tracing::info!("waze-exporter v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = startup::run(&cli.config_file).await {
        tracing::error!(error = %e, "Exporter stopped");
        return Err(e.into());
    }
    Ok(())
}
