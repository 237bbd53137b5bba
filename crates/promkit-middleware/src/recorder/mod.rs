//! HTTP request metrics recorder.
//!
//! A `RequestMetricsRecorder` owns five metrics, registered into a caller
//! supplied [`Registry`] exactly once at build time:
//!
//! | Metric | Type | Labels |
//! |---|---|---|
//! | `{ns}_uptime` | counter | name |
//! | `{ns}_http_request_count_total` | counter | status, endpoint, method |
//! | `{ns}_http_request_duration_seconds` | histogram | status, endpoint, method |
//! | `{ns}_http_request_size_bytes` | summary | status, endpoint, method |
//! | `{ns}_http_response_size_bytes` | summary | status, endpoint, method |
//!
//! Observations pass through an [`ExclusionFilter`] first; only those that
//! pass all three dimensions are recorded.

mod labels;

pub use labels::{
    matched_route, normalize_path, normalized_path, raw_path, request_size, response_size,
};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use promkit_core::error::Result;
use promkit_core::{
    Collector, CounterVec, Desc, ExclusionFilter, HistogramVec, MetricFamily, Opts, Registry,
    SummaryVec,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MetricsSection;
use crate::heartbeat::{spawn_heartbeat, HEARTBEAT_PERIOD};

const LABELS: [&str; 3] = ["status", "endpoint", "method"];

/// Maps a request to its `endpoint` label.
pub type EndpointLabelFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// One completed request.
#[derive(Debug, Clone)]
pub struct ObservationEvent {
    pub started_at: Instant,
    pub finished_at: Instant,
    pub status: String,
    pub endpoint: String,
    pub method: String,
    pub request_size: u64,
    /// Negative when unknown; recorded as zero.
    pub response_size: i64,
}

impl ObservationEvent {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }
}

/// The recorder's metric set, registered as a single collector so
/// registration is all-or-nothing.
#[derive(Debug)]
struct HttpMetrics {
    uptime: CounterVec,
    req_count: CounterVec,
    req_duration: HistogramVec,
    req_size: SummaryVec,
    resp_size: SummaryVec,
}

impl HttpMetrics {
    fn new(namespace: &str, buckets: &[f64]) -> Result<Self> {
        let opts = |name: &str, help: &str| Opts::new(name, help).namespace(namespace);
        Ok(Self {
            uptime: CounterVec::new(opts("uptime", "HTTP service uptime."), &["name"])?,
            req_count: CounterVec::new(
                opts("http_request_count_total", "Total number of HTTP requests made."),
                &LABELS,
            )?,
            req_duration: HistogramVec::new(
                opts("http_request_duration_seconds", "HTTP request latencies in seconds."),
                &LABELS,
                buckets,
            )?,
            req_size: SummaryVec::new(
                opts("http_request_size_bytes", "HTTP request sizes in bytes."),
                &LABELS,
            )?,
            resp_size: SummaryVec::new(
                opts("http_response_size_bytes", "HTTP response sizes in bytes."),
                &LABELS,
            )?,
        })
    }
}

impl Collector for HttpMetrics {
    fn describe(&self) -> Vec<Desc> {
        [
            self.uptime.describe(),
            self.req_count.describe(),
            self.req_duration.describe(),
            self.req_size.describe(),
            self.resp_size.describe(),
        ]
        .concat()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        [
            self.uptime.collect(),
            self.req_count.collect(),
            self.req_duration.collect(),
            self.req_size.collect(),
            self.resp_size.collect(),
        ]
        .concat()
    }
}

/// Options for [`RequestMetricsRecorder`]; every field has a default.
pub struct RecorderBuilder {
    namespace: String,
    service_name: String,
    buckets: Vec<f64>,
    handler_path: String,
    exclude_status: Vec<String>,
    exclude_endpoint: Vec<String>,
    exclude_method: Vec<String>,
    endpoint_label_fn: EndpointLabelFn,
}

impl Default for RecorderBuilder {
    fn default() -> Self {
        Self::from_config(&MetricsSection::default())
    }
}

impl RecorderBuilder {
    /// Seed options from the `metrics` config section.
    pub fn from_config(cfg: &MetricsSection) -> Self {
        Self {
            namespace: cfg.namespace.clone(),
            service_name: cfg.service_name.clone(),
            buckets: cfg.buckets.clone(),
            handler_path: cfg.handler_path.clone(),
            exclude_status: cfg.exclude.status.clone(),
            exclude_endpoint: cfg.exclude.endpoint.clone(),
            exclude_method: cfg.exclude.method.clone(),
            endpoint_label_fn: Arc::new(raw_path),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn buckets(mut self, buckets: &[f64]) -> Self {
        self.buckets = buckets.to_vec();
        self
    }

    pub fn handler_path(mut self, path: impl Into<String>) -> Self {
        self.handler_path = path.into();
        self
    }

    pub fn exclude_status<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.exclude_status = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_endpoint<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.exclude_endpoint = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_method<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.exclude_method = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Override the endpoint label. Collapsing parameterised routes is the
    /// caller's job; see [`matched_route`] and [`normalized_path`].
    pub fn endpoint_label_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.endpoint_label_fn = Arc::new(f);
        self
    }

    /// Build the recorder and register its metrics. Fails on invalid
    /// buckets or names, or when any metric name is already registered.
    pub fn build(self, registry: &Registry) -> Result<RequestMetricsRecorder> {
        let metrics = Arc::new(HttpMetrics::new(&self.namespace, &self.buckets)?);
        registry.register(metrics.clone())?;

        let filter = ExclusionFilter::new(
            &self.exclude_status,
            &self.exclude_endpoint,
            &self.exclude_method,
        );

        tracing::info!(
            namespace = %self.namespace,
            service = %self.service_name,
            handler_path = %self.handler_path,
            "request metrics registered"
        );

        Ok(RequestMetricsRecorder {
            service_name: self.service_name,
            handler_path: self.handler_path,
            filter,
            endpoint_label_fn: self.endpoint_label_fn,
            metrics,
        })
    }
}

pub struct RequestMetricsRecorder {
    service_name: String,
    handler_path: String,
    filter: ExclusionFilter,
    endpoint_label_fn: EndpointLabelFn,
    metrics: Arc<HttpMetrics>,
}

impl std::fmt::Debug for RequestMetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMetricsRecorder")
            .field("service_name", &self.service_name)
            .field("handler_path", &self.handler_path)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl RequestMetricsRecorder {
    pub fn builder() -> RecorderBuilder {
        RecorderBuilder::default()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Path the exposition route is mounted on.
    pub fn handler_path(&self) -> &str {
        &self.handler_path
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    /// Endpoint label for a request. A panicking label function falls back
    /// to the raw path.
    pub fn endpoint_label(&self, req: &Request) -> String {
        match catch_unwind(AssertUnwindSafe(|| (self.endpoint_label_fn)(req))) {
            Ok(label) => label,
            Err(_) => {
                tracing::warn!(path = %req.uri().path(), "endpoint label function panicked; using raw path");
                raw_path(req)
            }
        }
    }

    /// Record one observation if it passes the exclusion filter.
    ///
    /// Returns whether it was recorded. Failures are logged and dropped.
    pub fn record(&self, ev: &ObservationEvent) -> bool {
        if !self.filter.allows(&ev.status, &ev.endpoint, &ev.method) {
            return false;
        }
        match self.try_record(ev) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = e.kind().as_str(),
                    status = %ev.status,
                    endpoint = %ev.endpoint,
                    method = %ev.method,
                    "observation dropped"
                );
                false
            }
        }
    }

    fn try_record(&self, ev: &ObservationEvent) -> Result<()> {
        let lvs = [ev.status.as_str(), ev.endpoint.as_str(), ev.method.as_str()];
        let resp_size = ev.response_size.max(0);

        self.metrics.req_count.inc(&lvs)?;
        self.metrics
            .req_duration
            .observe(&lvs, ev.elapsed().as_secs_f64())?;
        self.metrics.req_size.observe(&lvs, ev.request_size as f64)?;
        self.metrics.resp_size.observe(&lvs, resp_size as f64)?;
        Ok(())
    }

    /// Start the uptime heartbeat; it runs until `cancel` fires.
    pub fn start_heartbeat(&self, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        self.start_heartbeat_every(HEARTBEAT_PERIOD, cancel)
    }

    pub(crate) fn start_heartbeat_every(
        &self,
        period: Duration,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let counter = self
            .metrics
            .uptime
            .with_label_values(&[self.service_name.as_str()])?;
        Ok(spawn_heartbeat(
            counter,
            self.service_name.clone(),
            period,
            cancel,
        ))
    }

    /// Uptime ticks recorded so far.
    pub fn uptime(&self) -> u64 {
        self.metrics.uptime.get(&[self.service_name.as_str()])
    }

    /// Requests recorded for one label tuple.
    pub fn request_count(&self, status: &str, endpoint: &str, method: &str) -> u64 {
        self.metrics.req_count.get(&[status, endpoint, method])
    }

    /// Duration histogram snapshot for one label tuple.
    pub fn request_duration(
        &self,
        status: &str,
        endpoint: &str,
        method: &str,
    ) -> Option<promkit_core::HistogramSnapshot> {
        self.metrics.req_duration.get(&[status, endpoint, method])
    }

    /// `(count, sum)` of request sizes for one label tuple.
    pub fn request_size(&self, status: &str, endpoint: &str, method: &str) -> Option<(u64, f64)> {
        self.metrics.req_size.get(&[status, endpoint, method])
    }

    /// `(count, sum)` of response sizes for one label tuple.
    pub fn response_size(&self, status: &str, endpoint: &str, method: &str) -> Option<(u64, f64)> {
        self.metrics.resp_size.get(&[status, endpoint, method])
    }
}

impl Collector for RequestMetricsRecorder {
    fn describe(&self) -> Vec<Desc> {
        self.metrics.describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.metrics.collect()
    }
}
