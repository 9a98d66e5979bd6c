//! Metrics registry and exposition.
//!
//! # Responsibilities
//! - Own a Prometheus recorder that is injected, never installed globally
//! - Hand out labeled gauge/counter handles for the collector
//! - Render the Prometheus text format for the scrape endpoint
//!
//! # Metrics
//! - `waze_travel_distance_meters{from,to}` (gauge)
//! - `waze_travel_time_seconds{from,to}` (gauge)
//! - `waze_api_calls{status}` (counter): `ok` / `ko` upstream calls
//! - `waze_time_seconds` (gauge, only ever incremented): cumulative seconds spent
//!   waiting on upstream calls. Exposed as a gauge because `metrics` counters
//!   are integral; the series name is unchanged from earlier exporter releases
//! - `waze_parameters{...}` (counter): declared run parameters, one per path
//!
//! # Design Decisions
//! - Handles are registered through `metrics::with_local_recorder`, so several
//!   registries can live side by side in one process (tests)
//! - Handles stay bound to the recorder storage after registration

use metrics::{Counter, Gauge, Label, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const TRAVEL_DISTANCE: &str = "waze_travel_distance_meters";
pub const TRAVEL_TIME: &str = "waze_travel_time_seconds";
pub const API_CALLS: &str = "waze_api_calls";
pub const TIME_SPENT: &str = "waze_time_seconds";
pub const PARAMETERS: &str = "waze_parameters";

/// Outcome label of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Ok,
    Ko,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Ok => "ok",
            CallStatus::Ko => "ko",
        }
    }
}

/// Explicit Prometheus registry.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let registry = Self { recorder, handle };
        registry.describe();
        registry
    }

    fn describe(&self) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::describe_gauge!(TRAVEL_DISTANCE, "travel distance in meters");
            metrics::describe_gauge!(TRAVEL_TIME, Unit::Seconds, "travel time in seconds");
            metrics::describe_counter!(API_CALLS, "number of calls to the Waze API");
            metrics::describe_gauge!(
                TIME_SPENT,
                Unit::Seconds,
                "total time spent to process Waze API calls"
            );
            metrics::describe_counter!(PARAMETERS, "Waze parameters");
        });
    }

    /// Distance and duration gauges of one path-direction.
    pub fn path_gauges(&self, from: &str, to: &str) -> (Gauge, Gauge) {
        let labels = || {
            vec![
                Label::new("from", from.to_string()),
                Label::new("to", to.to_string()),
            ]
        };
        metrics::with_local_recorder(&self.recorder, || {
            (
                metrics::gauge!(TRAVEL_DISTANCE, labels()),
                metrics::gauge!(TRAVEL_TIME, labels()),
            )
        })
    }

    pub fn calls_counter(&self, status: CallStatus) -> Counter {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(API_CALLS, "status" => status.as_str())
        })
    }

    /// Cumulative time spent in upstream calls, in fractional seconds.
    pub fn time_spent_gauge(&self) -> Gauge {
        metrics::with_local_recorder(&self.recorder, || metrics::gauge!(TIME_SPENT))
    }

    /// Publish the declared parameters of one path.
    pub fn record_parameters(&self, labels: Vec<Label>) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(PARAMETERS, labels).absolute(1);
        });
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Current value of one series, read back from the exposition.
    pub fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        sample_value(&self.render(), name, labels)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a series in Prometheus text output by name and exact label set.
pub fn sample_value(exposition: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let mut wanted: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    wanted.sort();

    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (series_name, series_labels) = match series.split_once('{') {
                Some((n, rest)) => (n, parse_labels(rest.strip_suffix('}')?)),
                None => (series, Vec::new()),
            };
            (series_name == name && series_labels == wanted)
                .then(|| value.parse().ok())
                .flatten()
        })
}

fn parse_labels(body: &str) -> Vec<(String, String)> {
    let mut labels: Vec<(String, String)> = body
        .split("\",")
        .filter_map(|pair| {
            let (key, value) = pair.split_once("=\"")?;
            Some((key.trim().to_string(), value.trim_end_matches('"').to_string()))
        })
        .collect();
    labels.sort();
    labels
}
