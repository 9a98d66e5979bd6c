//! Waze travel-time exporter library.
//!
//! Periodically asks the Waze routing service for travel time and distance
//! between named places and republishes them as Prometheus gauges.

pub mod collector;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod waze;

pub use collector::{Collector, CycleOutcome, CycleReport, PathMetric, RouteSource};
pub use config::ExporterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::MetricsRegistry;
