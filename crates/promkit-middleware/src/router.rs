//! Axum router wiring.
//!
//! `MetricsRouterExt` instruments any router and mounts the exposition
//! route; `build_router` assembles the demo service on top of it.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use promkit_core::Registry;

use crate::{app_state::AppState, ops, recorder::RequestMetricsRecorder, transport};

pub trait MetricsRouterExt {
    /// Record every request through `recorder` and serve `registry` at the
    /// recorder's handler path. Requests to the exposition route are
    /// recorded too, unless excluded by the recorder's endpoint patterns.
    fn with_request_metrics(
        self,
        recorder: Arc<RequestMetricsRecorder>,
        registry: Arc<Registry>,
    ) -> Self;
}

impl<S> MetricsRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_request_metrics(
        self,
        recorder: Arc<RequestMetricsRecorder>,
        registry: Arc<Registry>,
    ) -> Self {
        let path = recorder.handler_path().to_string();
        self.route(&path, get(ops::metrics).with_state(registry))
            .layer(middleware::from_fn_with_state(recorder, transport::track_requests))
    }
}

async fn ping() -> &'static str {
    "pong"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/healthz", get(ops::healthz))
        .with_request_metrics(state.recorder(), state.registry())
        .with_state(state)
}
