//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format (path configurable)

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use promkit_core::{encode_text, Registry, TEXT_CONTENT_TYPE};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Render the current snapshot of every registered metric.
pub fn render_metrics(registry: &Registry) -> Response {
    let body = encode_text(&registry.gather());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

pub async fn metrics(State(registry): State<Arc<Registry>>) -> Response {
    render_metrics(&registry)
}
