//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! collector cycle
//!     → metrics.rs (gauges and counters in an injected registry)
//!     → /metrics scrape renders the registry
//!
//! all subsystems
//!     → logging.rs (structured log events to stderr)
//! ```

pub mod logging;
pub mod metrics;

pub use self::metrics::{CallStatus, MetricsRegistry};
