//! Routing query construction.
//!
//! A [`RouteQuery`] is built once per path-direction at startup and never
//! mutated afterwards. Building is pure: the same inputs always produce the
//! same URL, parameters encoded in sorted key order.

use std::collections::BTreeMap;

use url::Url;

use crate::config::ExporterConfig;
use crate::waze::types::{Region, Vehicle};

/// Upstream origin shared by the geocode and routing endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    base: Url,
}

impl Upstream {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base).map(Self::new)
    }

    /// Value of the `Referer` header expected by the service.
    pub fn referer(&self) -> String {
        let mut referer = self.base.clone();
        referer.set_path("/");
        referer.set_query(None);
        referer.to_string()
    }

    pub(crate) fn endpoint(&self, path: &str, params: &BTreeMap<&str, String>) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.query_pairs_mut()
            .clear()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}

/// Routing preferences shared by every path of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOptions {
    pub region: Region,
    pub vehicle: Vehicle,
    pub avoid_toll: bool,
    pub avoid_subscription_road: bool,
    pub avoid_ferry: bool,
}

impl From<&ExporterConfig> for RouteOptions {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            region: config.region,
            vehicle: config.vehicle,
            avoid_toll: config.avoid_toll,
            avoid_subscription_road: config.avoid_subscription_road,
            avoid_ferry: config.avoid_ferry,
        }
    }
}

/// Immutable, fully formed routing request for one path-direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    from: String,
    to: String,
    options: RouteOptions,
    url: Url,
}

impl RouteQuery {
    /// Build the query between two coordinate tokens.
    pub fn new(upstream: &Upstream, from: &str, to: &str, options: RouteOptions) -> Self {
        let mut params = BTreeMap::new();

        if options.vehicle != Vehicle::Regular {
            params.insert("vehicleType", options.vehicle.to_string());
        }

        let mut directives = vec!["AVOID_TRAILS:t"];
        if options.avoid_toll {
            directives.push("AVOID_TOLL_ROADS:t");
        }
        if options.avoid_ferry {
            directives.push("AVOID_FERRIES:t");
        }
        params.insert("options", directives.join(","));

        if !options.avoid_subscription_road {
            params.insert("subscription", "*".to_string());
        }

        params.insert("from", from.to_string());
        params.insert("to", to.to_string());
        params.insert("at", "0".to_string());
        params.insert("returnJSON", "true".to_string());
        params.insert("timeout", "60000".to_string());
        params.insert("nPaths", "1".to_string());

        let url = upstream.endpoint(options.region.routing_path(), &params);

        Self {
            from: from.to_string(),
            to: to.to_string(),
            options,
            url,
        }
    }

    /// Same query with origin and destination swapped.
    pub fn reversed(&self, upstream: &Upstream) -> Self {
        Self::new(upstream, &self.to, &self.from, self.options)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn from_coordinates(&self) -> &str {
        &self.from
    }

    pub fn to_coordinates(&self) -> &str {
        &self.to
    }

    pub fn options(&self) -> RouteOptions {
        self.options
    }
}
