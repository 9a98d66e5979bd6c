//! HTTP client for the routing service.
//!
//! # Responsibilities
//! - Issue geocode and routing GET requests with the expected referer
//! - Map transport failures, HTTP status and body decoding to [`WazeError`]
//! - Bound every call with the configured timeout
//!
//! No retry happens here: one failed round trip is one reported failure.

use std::time::Duration;

use reqwest::header::{HeaderValue, REFERER};
use serde::de::DeserializeOwned;
use url::Url;

use crate::waze::query::{RouteQuery, Upstream};
use crate::waze::response::RoutingResponse;
use crate::waze::types::{RouteResult, WazeResult};
use crate::waze::WazeError;

/// Routing service client.
#[derive(Clone)]
pub struct WazeClient {
    http: reqwest::Client,
    upstream: Upstream,
}

impl WazeClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(upstream: Upstream, timeout: Duration) -> WazeResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_str(&upstream.referer())?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, upstream })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Run one routing query.
    ///
    /// Returns the primary route first, then the alternatives.
    pub async fn route(&self, query: &RouteQuery) -> WazeResult<Vec<RouteResult>> {
        let response: RoutingResponse = self.get_json(query.url().clone()).await?;
        response.into_results()
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> WazeResult<T> {
        tracing::debug!(url = %url, "Calling upstream");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WazeError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
