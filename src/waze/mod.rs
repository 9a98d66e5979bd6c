//! Routing service integration.
//!
//! # Data Flow
//! ```text
//! address book entry
//!     → geocode.rs (search endpoint, first named candidate)
//!     → coordinate token "x:<lon> y:<lat>"
//!     → query.rs (RouteQuery, immutable URL)
//!     → client.rs (GET with referer, status check)
//!     → response.rs (primary + alternatives → RouteResult)
//! ```

pub mod client;
pub mod geocode;
pub mod query;
pub(crate) mod response;
pub mod types;

pub use client::WazeClient;
pub use geocode::{resolve_addresses, ResolveError, ResolvedAddresses};
pub use query::{RouteOptions, RouteQuery, Upstream};
pub use types::{Coordinates, Region, RouteResult, Vehicle, WazeError, WazeResult};
