//! HTTP exposition subsystem.
//!
//! # Data Flow
//! ```text
//! GET /metrics
//!     → server.rs (Axum router, trace layer)
//!     → collector cycle (spawned task, single-flight)
//!     → registry rendered as Prometheus text
//! ```

pub mod server;

pub use server::{AppState, HttpServer, METRICS_PATH};
