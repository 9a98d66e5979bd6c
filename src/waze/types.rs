//! Region/vehicle enumerations, results and error definitions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Upstream geographic partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    /// Rest of world.
    #[default]
    Row,
    Us,
    Il,
}

const REGIONS: [(Region, &str); 3] = [(Region::Row, "ROW"), (Region::Us, "US"), (Region::Il, "IL")];

impl Region {
    pub const ALL: [Region; 3] = [Region::Row, Region::Us, Region::Il];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Row => "ROW",
            Region::Us => "US",
            Region::Il => "IL",
        }
    }

    /// Path of the geocode endpoint for this region.
    pub fn geocode_path(self) -> &'static str {
        match self {
            Region::Row => "/row-SearchServer/mozi",
            Region::Us => "/SearchServer/mozi",
            Region::Il => "/il-SearchServer/mozi",
        }
    }

    /// Path of the routing endpoint for this region.
    pub fn routing_path(self) -> &'static str {
        match self {
            Region::Row => "/row-RoutingManager/routingRequest",
            Region::Us => "/RoutingManager/routingRequest",
            Region::Il => "/il-RoutingManager/routingRequest",
        }
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        REGIONS
            .iter()
            .find(|(_, token)| *token == upper)
            .map(|(region, _)| *region)
            .ok_or_else(|| ConfigError::UnknownRegion(s.to_string()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Region {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.as_str().to_string()
    }
}

/// Upstream routing profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Vehicle {
    /// Private car; serialized as the empty string.
    #[default]
    Regular,
    Taxi,
    Motorcycle,
}

const VEHICLES: [(Vehicle, &str); 3] = [
    (Vehicle::Regular, ""),
    (Vehicle::Taxi, "TAXI"),
    (Vehicle::Motorcycle, "MOTORCYCLE"),
];

impl Vehicle {
    pub const ALL: [Vehicle; 3] = [Vehicle::Regular, Vehicle::Taxi, Vehicle::Motorcycle];

    pub fn as_str(self) -> &'static str {
        match self {
            Vehicle::Regular => "",
            Vehicle::Taxi => "TAXI",
            Vehicle::Motorcycle => "MOTORCYCLE",
        }
    }
}

impl FromStr for Vehicle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        VEHICLES
            .iter()
            .find(|(_, token)| *token == upper)
            .map(|(vehicle, _)| *vehicle)
            .ok_or_else(|| ConfigError::UnknownVehicle(s.to_string()))
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Vehicle {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vehicle> for String {
    fn from(vehicle: Vehicle) -> Self {
        vehicle.as_str().to_string()
    }
}

/// Resolved position of an address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl fmt::Display for Coordinates {
    /// Formats as the `x:<lon> y:<lat>` token the routing endpoint expects.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x:{:.6} y:{:.6}", self.lon, self.lat)
    }
}

/// Travel estimate for one route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteResult {
    pub duration: Duration,
    /// Meters.
    pub distance: u64,
}

/// Errors that can occur while talking to the routing service.
#[derive(Debug, Error)]
pub enum WazeError {
    /// Connection, timeout or body transfer failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    /// Body is not the expected JSON shape.
    #[error("cannot decode response: {0}")]
    Decode(String),

    /// Geocoder returned no usable candidate.
    #[error("address not found: {0}")]
    AddressNotFound(String),

    /// The upstream origin cannot be sent as a `Referer` header.
    #[error("invalid referer header: {0}")]
    InvalidReferer(#[from] reqwest::header::InvalidHeaderValue),
}

impl From<serde_json::Error> for WazeError {
    fn from(e: serde_json::Error) -> Self {
        WazeError::Decode(e.to_string())
    }
}

/// Result type for upstream operations.
pub type WazeResult<T> = Result<T, WazeError>;
