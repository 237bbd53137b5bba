//! axum middleware that feeds every request through a `RequestMetricsRecorder`.
//!
//! Install with [`crate::router::MetricsRouterExt::with_request_metrics`] or
//! directly:
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/ping", get(ping))
//!     .layer(axum::middleware::from_fn_with_state(recorder.clone(), track_requests));
//! ```
//!
//! Responses whose length is known up front are recorded as soon as the
//! handler returns. Streamed bodies are recorded when the body finishes (or
//! is dropped by the client), with the number of bytes actually sent.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::StreamExt;

use crate::recorder::{request_size, response_size, ObservationEvent, RequestMetricsRecorder};

/// Time the wrapped handler and record the outcome. The response is always
/// returned with its status, headers and bytes unchanged; recording problems
/// are logged by the recorder.
pub async fn track_requests(
    State(recorder): State<Arc<RequestMetricsRecorder>>,
    request: Request,
    next: Next,
) -> Response {
    let started_at = Instant::now();
    let method = request.method().to_string();
    let endpoint = recorder.endpoint_label(&request);
    let request_size = request_size(&request);

    let response = next.run(request).await;

    let ev = ObservationEvent {
        started_at,
        finished_at: Instant::now(),
        status: response.status().as_u16().to_string(),
        endpoint,
        method,
        request_size,
        response_size: response_size(&response),
    };

    if ev.response_size >= 0 || !recorder.filter().allows(&ev.status, &ev.endpoint, &ev.method) {
        recorder.record(&ev);
        return response;
    }

    let mut pending = PendingObservation {
        recorder,
        ev,
        sent: 0,
    };
    let (parts, body) = response.into_parts();
    let counted = body.into_data_stream().map(move |chunk| {
        if let Ok(bytes) = &chunk {
            pending.sent += bytes.len() as u64;
        }
        chunk
    });
    Response::from_parts(parts, Body::from_stream(counted))
}

/// Observation of a streamed response, recorded once its body is done.
struct PendingObservation {
    recorder: Arc<RequestMetricsRecorder>,
    ev: ObservationEvent,
    sent: u64,
}

impl Drop for PendingObservation {
    fn drop(&mut self) {
        self.ev.finished_at = Instant::now();
        self.ev.response_size = i64::try_from(self.sent).unwrap_or(i64::MAX);
        self.recorder.record(&self.ev);
    }
}
