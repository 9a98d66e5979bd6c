//! Per path-direction gauge state.

use metrics::{Gauge, Label};

use crate::config::{ExporterConfig, ValidationError};
use crate::observability::MetricsRegistry;
use crate::waze::{ResolvedAddresses, RouteOptions, RouteQuery, RouteResult, Upstream};

/// One monitored directed query with its own gauge pair.
pub struct PathMetric {
    from: String,
    to: String,
    query: RouteQuery,
    distance: Gauge,
    duration: Gauge,
}

impl PathMetric {
    pub fn new(from: &str, to: &str, query: RouteQuery, registry: &MetricsRegistry) -> Self {
        tracing::info!(from = %from, to = %to, url = %query.url(), "Creating path metrics");
        let (distance, duration) = registry.path_gauges(from, to);
        Self {
            from: from.to_string(),
            to: to.to_string(),
            query,
            distance,
            duration,
        }
    }

    pub fn from_name(&self) -> &str {
        &self.from
    }

    pub fn to_name(&self) -> &str {
        &self.to
    }

    pub fn query(&self) -> &RouteQuery {
        &self.query
    }

    /// Publish a fresh estimate. Duration is rounded to the whole second.
    pub(crate) fn record(&self, result: &RouteResult) {
        self.distance.set(result.distance as f64);
        self.duration.set(result.duration.as_secs_f64().round());
    }
}

/// Build path metrics in configuration order, each reverse direction
/// immediately after its forward one.
///
/// Every name must be present in `resolved`. A missing one fails the whole
/// build before any gauge is registered.
pub fn build_path_metrics(
    config: &ExporterConfig,
    resolved: &ResolvedAddresses,
    upstream: &Upstream,
    registry: &MetricsRegistry,
) -> Result<Vec<PathMetric>, ValidationError> {
    let options = RouteOptions::from(config);
    let lookup = |index: usize, name: &str| {
        resolved.get(name).ok_or_else(|| ValidationError::UnknownAddress {
            index,
            name: name.to_string(),
        })
    };

    let mut queries = Vec::with_capacity(config.paths.len());
    for (index, path) in config.paths.iter().enumerate() {
        let from = lookup(index, &path.from)?;
        let to = lookup(index, &path.to)?;
        queries.push((path, RouteQuery::new(upstream, from, to, options)));
    }

    let mut metrics = Vec::with_capacity(config.paths.len() * 2);
    for (path, query) in queries {
        let reversed = path.bidirectional.then(|| query.reversed(upstream));

        metrics.push(PathMetric::new(&path.from, &path.to, query, registry));
        if let Some(reversed) = reversed {
            metrics.push(PathMetric::new(&path.to, &path.from, reversed, registry));
        }

        registry.record_parameters(parameter_labels(config, &path.from, &path.to, path.bidirectional));
    }

    Ok(metrics)
}

fn parameter_labels(config: &ExporterConfig, from: &str, to: &str, bidirectional: bool) -> Vec<Label> {
    vec![
        Label::new("from", from.to_string()),
        Label::new("to", to.to_string()),
        Label::new("region", config.region.to_string()),
        Label::new("sleep", config.sleep.to_string()),
        Label::new("vehicle", config.vehicle.to_string()),
        Label::new("avoid_toll", config.avoid_toll.to_string()),
        Label::new("avoid_subscription_road", config.avoid_subscription_road.to_string()),
        Label::new("avoid_ferry", config.avoid_ferry.to_string()),
        Label::new("bidirectional", bidirectional.to_string()),
    ]
}
