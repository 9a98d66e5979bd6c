//! Address resolution through the geocode endpoint.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::waze::client::WazeClient;
use crate::waze::response::{first_named, GeocodeCandidate};
use crate::waze::types::{Coordinates, Region, WazeError, WazeResult};

/// Failure to resolve one address-book entry.
#[derive(Debug, Error)]
#[error("cannot resolve address '{name}': {source}")]
pub struct ResolveError {
    pub name: String,
    #[source]
    pub source: WazeError,
}

/// Address-book names mapped to coordinate tokens. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAddresses {
    tokens: BTreeMap<String, String>,
}

impl ResolvedAddresses {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl FromIterator<(String, String)> for ResolvedAddresses {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl WazeClient {
    /// Look up a free-text address and return the first named candidate.
    pub async fn resolve_address(&self, address: &str, region: Region) -> WazeResult<Coordinates> {
        tracing::info!(address = %address, region = %region, "Looking up address");

        let mut params = BTreeMap::new();
        params.insert("q", address.to_string());
        params.insert("lat", "0".to_string());
        params.insert("lon", "0".to_string());
        let url = self.upstream().endpoint(region.geocode_path(), &params);

        let candidates: Vec<GeocodeCandidate> = self.get_json(url).await?;
        first_named(&candidates).ok_or_else(|| WazeError::AddressNotFound(address.to_string()))
    }
}

/// Resolve each distinct name once, in order of first appearance.
pub async fn resolve_addresses<'a, I>(
    client: &WazeClient,
    addresses: &BTreeMap<String, String>,
    names: I,
    region: Region,
) -> Result<ResolvedAddresses, ResolveError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tokens = BTreeMap::new();

    for name in names {
        if tokens.contains_key(name) {
            continue;
        }
        let address = addresses.get(name).ok_or_else(|| ResolveError {
            name: name.to_string(),
            source: WazeError::AddressNotFound(name.to_string()),
        })?;

        let coordinates = client
            .resolve_address(address, region)
            .await
            .map_err(|source| ResolveError {
                name: name.to_string(),
                source,
            })?;

        tracing::info!(name = %name, coordinates = %coordinates, "Address resolved");
        tokens.insert(name.to_string(), coordinates.to_string());
    }

    Ok(ResolvedAddresses { tokens })
}
