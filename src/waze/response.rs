//! Wire shapes of the upstream JSON responses.

use std::time::Duration;

use serde::Deserialize;

use crate::waze::types::{Coordinates, RouteResult, WazeError, WazeResult};

/// Body of a routing request.
#[derive(Debug, Deserialize)]
pub(crate) struct RoutingResponse {
    pub response: Option<RouteSummary>,
    pub alternatives: Option<Vec<RoutingAlternative>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutingAlternative {
    pub response: RouteSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RouteSummary {
    #[serde(default)]
    pub results: Option<Vec<RouteSegment>>,
    #[serde(default)]
    pub total_route_time: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteSegment {
    #[serde(default)]
    pub length: u64,
}

impl RouteSummary {
    fn to_result(&self) -> WazeResult<RouteResult> {
        let duration = Duration::try_from_secs_f64(self.total_route_time).map_err(|_| {
            WazeError::Decode(format!("invalid totalRouteTime {}", self.total_route_time))
        })?;
        let distance = self.results.iter().flatten().map(|segment| segment.length).sum();
        Ok(RouteResult { duration, distance })
    }
}

impl RoutingResponse {
    /// Primary route first, then alternatives in upstream order.
    pub fn into_results(self) -> WazeResult<Vec<RouteResult>> {
        self.response
            .iter()
            .chain(self.alternatives.iter().flatten().map(|alt| &alt.response))
            .map(RouteSummary::to_result)
            .collect()
    }
}

/// One candidate returned by the geocoder.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeCandidate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: GeocodeLocation,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeocodeLocation {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

/// First candidate carrying a non-empty name.
pub(crate) fn first_named(candidates: &[GeocodeCandidate]) -> Option<Coordinates> {
    candidates
        .iter()
        .find(|c| c.name.as_deref().is_some_and(|name| !name.is_empty()))
        .map(|c| Coordinates {
            lon: c.location.lon,
            lat: c.location.lat,
        })
}
