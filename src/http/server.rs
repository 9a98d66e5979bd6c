//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the scrape handler
//! - Run one collection cycle per scrape, detached from the request
//! - Render the registry in Prometheus text format
//! - Stop accepting on shutdown

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::collector::{Collector, CycleOutcome, RouteSource};
use crate::lifecycle::Shutdown;
use crate::observability::MetricsRegistry;

pub const METRICS_PATH: &str = "/metrics";

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Application state injected into handlers.
pub struct AppState<S> {
    pub collector: Arc<Collector<S>>,
    pub registry: Arc<MetricsRegistry>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
            registry: self.registry.clone(),
        }
    }
}

/// HTTP server exposing the metrics endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new<S>(collector: Arc<Collector<S>>, registry: Arc<MetricsRegistry>) -> Self
    where
        S: RouteSource + 'static,
    {
        let state = AppState { collector, registry };
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router<S>(state: AppState<S>) -> Router
    where
        S: RouteSource + 'static,
    {
        Router::new()
            .route(METRICS_PATH, get(metrics_handler::<S>))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = METRICS_PATH, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Scrape handler: one cycle, then the full exposition.
///
/// The cycle outlives the request if the scraper disconnects first.
async fn metrics_handler<S>(State(state): State<AppState<S>>) -> Response
where
    S: RouteSource + 'static,
{
    match state.collector.clone().collect_detached().await {
        Ok(CycleOutcome::Completed(report)) => {
            tracing::debug!(
                succeeded = report.succeeded,
                failed = report.failed,
                "Scrape cycle done"
            );
        }
        Ok(CycleOutcome::Coalesced) => {}
        Err(e) => {
            tracing::error!(error = %e, "Collection task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "collection failed\n").into_response();
        }
    }
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], state.registry.render()).into_response()
}
