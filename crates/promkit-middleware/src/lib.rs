//! promkit HTTP/RPC middleware.
//!
//! Wires the request recorder, uptime heartbeat, RPC interceptors and the
//! exposition route onto axum. Consumed by the demo binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod heartbeat;
pub mod ops;
pub mod recorder;
pub mod router;
pub mod rpc;
pub mod transport;

pub use recorder::{EndpointLabelFn, ObservationEvent, RecorderBuilder, RequestMetricsRecorder};
pub use router::MetricsRouterExt;
pub use rpc::{ServerMetrics, ServerMetricsBuilder, ServerReporter};
