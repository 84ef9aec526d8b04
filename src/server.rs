//! Metrics exposition endpoint.
//!
//! A single `GET /metrics` route in the Prometheus text format, enabled
//! only when a listen address is configured. Binding happens at startup so
//! an unusable address is a fatal configuration error rather than a silent
//! background failure.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::metrics::Metrics;

pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(metrics)
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bind the metrics listener. Kept separate from [`serve_on`] so the caller
/// can treat a bind failure as a startup error.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics listener on {addr}"))
}

/// Serve the metrics endpoint until the process exits.
pub async fn serve_on(listener: TcpListener, metrics: Arc<Metrics>) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("metrics endpoint listening on http://{addr}/metrics");
    }
    axum::serve(listener, router(metrics)).await?;
    Ok(())
}
