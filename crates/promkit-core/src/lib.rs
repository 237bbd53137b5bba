//! promkit core: runtime-free metric primitives, the owned registry, the
//! exclusion filter and the text exposition encoder.
//!
//! This crate carries no HTTP or async runtime dependencies so the same
//! primitives back both the axum middleware and the RPC interceptor.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied outside tests. Metric
//! updates surface failures as `MetricsError` so instrumentation never takes
//! a request down with it.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod desc;
pub mod encode;
pub mod error;
pub mod family;
pub mod filter;
pub mod metric;
pub mod registry;

pub use desc::{Desc, MetricKind, Opts};
pub use encode::{encode_text, TEXT_CONTENT_TYPE};
/// Shared result type.
pub use error::{ErrorKind, MetricsError, Result};
pub use family::{HistogramSnapshot, MetricFamily, Series, Value};
pub use filter::{Dimension, ExclusionFilter, PatternSet};
pub use metric::{
    validate_buckets, Counter, CounterVec, Histogram, HistogramVec, Summary, SummaryVec,
    DEFAULT_BUCKETS,
};
pub use registry::{Collector, Registry};
