//! RPC server metrics in interceptor style.
//!
//! Framework-agnostic: callers hand over the full method name
//! (`/package.Service/Method`) and the handler future or stream, and the
//! interceptor records
//!
//! - `{ns}_grpc_server_started_total{grpc_type,grpc_service,grpc_method}`
//! - `{ns}_grpc_server_handled_total{grpc_type,grpc_service,grpc_method,grpc_code}`
//! - `{ns}_grpc_server_msg_received_total{grpc_type,grpc_service,grpc_method}`
//! - `{ns}_grpc_server_msg_sent_total{grpc_type,grpc_service,grpc_method}`
//! - `{ns}_grpc_server_handling_seconds{grpc_type,grpc_service,grpc_method}` (opt-in)
//! - `{ns}_uptime{name}`
//!
//! `ServerMetrics` is a [`Collector`]; register it on a [`promkit_core::Registry`]
//! before serving traffic. The exclusion filter maps status to the code
//! name, endpoint to the service and method to the method name.

mod code;
mod stream;

pub use code::{Code, RpcStatus, RpcType};
pub use stream::MonitoredStream;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use promkit_core::error::Result;
use promkit_core::{
    Collector, CounterVec, Desc, Dimension, ExclusionFilter, HistogramVec, MetricFamily, Opts,
    DEFAULT_BUCKETS,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::heartbeat::{spawn_heartbeat, HEARTBEAT_PERIOD};

const LABELS: [&str; 3] = ["grpc_type", "grpc_service", "grpc_method"];
const HANDLED_LABELS: [&str; 4] = ["grpc_type", "grpc_service", "grpc_method", "grpc_code"];

/// Static description of one method, for pre-populating series.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub client_stream: bool,
    pub server_stream: bool,
}

impl MethodInfo {
    pub fn unary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_stream: false,
            server_stream: false,
        }
    }

    pub fn rpc_type(&self) -> RpcType {
        RpcType::from_flags(self.client_stream, self.server_stream)
    }
}

/// A service and its methods.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub methods: Vec<MethodInfo>,
}

/// Split `/package.Service/Method` into `(package.Service, Method)`.
pub fn split_method_name(full_method: &str) -> (&str, &str) {
    let trimmed = full_method.strip_prefix('/').unwrap_or(full_method);
    match trimmed.split_once('/') {
        Some((service, method)) => (service, method),
        None => ("unknown", "unknown"),
    }
}

pub struct ServerMetricsBuilder {
    namespace: String,
    service_name: String,
    exclude_status: Vec<String>,
    exclude_endpoint: Vec<String>,
    exclude_method: Vec<String>,
    handling_buckets: Option<Vec<f64>>,
}

impl Default for ServerMetricsBuilder {
    fn default() -> Self {
        Self {
            namespace: "service".into(),
            service_name: "service".into(),
            exclude_status: Vec::new(),
            exclude_endpoint: Vec::new(),
            exclude_method: Vec::new(),
            handling_buckets: None,
        }
    }
}

impl ServerMetricsBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
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

    /// Also record handling latency. `None` uses [`DEFAULT_BUCKETS`].
    /// Histograms are expensive on the scraping side, hence opt-in.
    pub fn enable_handling_time_histogram(mut self, buckets: Option<&[f64]>) -> Self {
        self.handling_buckets = Some(buckets.unwrap_or(DEFAULT_BUCKETS).to_vec());
        self
    }

    pub fn build(self) -> Result<ServerMetrics> {
        let ns = self.namespace.as_str();
        let opts = |name: &str, help: &str| Opts::new(name, help).namespace(ns);

        let handling = match &self.handling_buckets {
            Some(b) => Some(HistogramVec::new(
                opts(
                    "grpc_server_handling_seconds",
                    "Histogram of response latency (seconds) of gRPC that had been application-level handled by the server.",
                ),
                &LABELS,
                b,
            )?),
            None => None,
        };

        Ok(ServerMetrics {
            service_name: self.service_name.clone(),
            filter: ExclusionFilter::new(
                &self.exclude_status,
                &self.exclude_endpoint,
                &self.exclude_method,
            ),
            uptime: CounterVec::new(opts("uptime", "HTTP service uptime."), &["name"])?,
            started: CounterVec::new(
                opts("grpc_server_started_total", "Total number of RPCs started on the server."),
                &LABELS,
            )?,
            handled: CounterVec::new(
                opts(
                    "grpc_server_handled_total",
                    "Total number of RPCs completed on the server, regardless of success or failure.",
                ),
                &HANDLED_LABELS,
            )?,
            msg_received: CounterVec::new(
                opts(
                    "grpc_server_msg_received_total",
                    "Total number of RPC stream messages received on the server.",
                ),
                &LABELS,
            )?,
            msg_sent: CounterVec::new(
                opts(
                    "grpc_server_msg_sent_total",
                    "Total number of gRPC stream messages sent by the server.",
                ),
                &LABELS,
            )?,
            handling,
        })
    }
}

pub struct ServerMetrics {
    service_name: String,
    filter: ExclusionFilter,
    uptime: CounterVec,
    started: CounterVec,
    handled: CounterVec,
    msg_received: CounterVec,
    msg_sent: CounterVec,
    handling: Option<HistogramVec>,
}

impl std::fmt::Debug for ServerMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerMetrics")
            .field("service_name", &self.service_name)
            .field("handling_histogram", &self.handling.is_some())
            .finish_non_exhaustive()
    }
}

fn log_dropped(metric: &str, e: &promkit_core::MetricsError) {
    tracing::warn!(metric, error = %e, kind = e.kind().as_str(), "rpc observation dropped");
}

impl ServerMetrics {
    pub fn builder() -> ServerMetricsBuilder {
        ServerMetricsBuilder::default()
    }

    /// Start reporting one RPC. Counts it as started.
    pub fn reporter(self: &Arc<Self>, rpc_type: RpcType, full_method: &str) -> ServerReporter {
        let (service, method) = split_method_name(full_method);
        let reporter = ServerReporter {
            metrics: Arc::clone(self),
            rpc_type,
            service: service.to_string(),
            method: method.to_string(),
            start: Instant::now(),
            tracked: self.filter.dimension(Dimension::Endpoint).allows(service)
                && self.filter.dimension(Dimension::Method).allows(method),
        };
        if reporter.tracked {
            if let Err(e) = self.started.inc(&reporter.labels()) {
                log_dropped("grpc_server_started_total", &e);
            }
        }
        reporter
    }

    /// Unary interceptor: counts the request message, awaits the handler,
    /// reports the resulting code and counts the response message on success.
    pub async fn unary<F, T, E>(self: &Arc<Self>, full_method: &str, handler: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: RpcStatus,
    {
        let reporter = self.reporter(RpcType::Unary, full_method);
        reporter.received_message();

        let res = handler.await;
        match &res {
            Ok(_) => {
                reporter.handled(Code::Ok);
                reporter.sent_message();
            }
            Err(e) => reporter.handled(e.code()),
        }
        res
    }

    /// Streaming interceptor: the handler gets a reporter to wrap its inbound
    /// stream ([`MonitoredStream`]) and count outbound messages; the final
    /// code is reported when it returns.
    pub async fn streaming<F, Fut, T, E>(
        self: &Arc<Self>,
        rpc_type: RpcType,
        full_method: &str,
        handler: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(ServerReporter) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: RpcStatus,
    {
        let reporter = self.reporter(rpc_type, full_method);
        let res = handler(reporter.clone()).await;
        let code = match &res {
            Ok(_) => Code::Ok,
            Err(e) => e.code(),
        };
        reporter.handled(code);
        res
    }

    /// Create zero-valued series for every known method (and, for
    /// `handled_total`, every code) so queries see no gaps before traffic.
    pub fn initialize_metrics(&self, services: &[ServiceInfo]) {
        for svc in services {
            for m in &svc.methods {
                let lvs = [m.rpc_type().as_str(), svc.name.as_str(), m.name.as_str()];
                let res = self
                    .started
                    .with_label_values(&lvs)
                    .and_then(|_| self.msg_received.with_label_values(&lvs))
                    .and_then(|_| self.msg_sent.with_label_values(&lvs));
                if let Err(e) = res {
                    log_dropped("grpc_server_*", &e);
                }
                if let Some(h) = &self.handling {
                    if let Err(e) = h.with_label_values(&lvs) {
                        log_dropped("grpc_server_handling_seconds", &e);
                    }
                }
                for code in Code::ALL {
                    let lvs = [lvs[0], lvs[1], lvs[2], code.as_str()];
                    if let Err(e) = self.handled.with_label_values(&lvs) {
                        log_dropped("grpc_server_handled_total", &e);
                    }
                }
            }
        }
    }

    /// Start the uptime heartbeat; it runs until `cancel` fires.
    pub fn start_heartbeat(&self, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        let counter = self
            .uptime
            .with_label_values(&[self.service_name.as_str()])?;
        Ok(spawn_heartbeat(
            counter,
            self.service_name.clone(),
            HEARTBEAT_PERIOD,
            cancel,
        ))
    }

    pub fn started_total(&self, rpc_type: RpcType, service: &str, method: &str) -> u64 {
        self.started.get(&[rpc_type.as_str(), service, method])
    }

    pub fn handled_total(&self, rpc_type: RpcType, service: &str, method: &str, code: Code) -> u64 {
        self.handled
            .get(&[rpc_type.as_str(), service, method, code.as_str()])
    }

    pub fn received_total(&self, rpc_type: RpcType, service: &str, method: &str) -> u64 {
        self.msg_received.get(&[rpc_type.as_str(), service, method])
    }

    pub fn sent_total(&self, rpc_type: RpcType, service: &str, method: &str) -> u64 {
        self.msg_sent.get(&[rpc_type.as_str(), service, method])
    }

    pub fn uptime(&self) -> u64 {
        self.uptime.get(&[self.service_name.as_str()])
    }
}

impl Collector for ServerMetrics {
    fn describe(&self) -> Vec<Desc> {
        let mut out = [
            self.uptime.describe(),
            self.started.describe(),
            self.handled.describe(),
            self.msg_received.describe(),
            self.msg_sent.describe(),
        ]
        .concat();
        if let Some(h) = &self.handling {
            out.extend(h.describe());
        }
        out
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut out = [
            self.uptime.collect(),
            self.started.collect(),
            self.handled.collect(),
            self.msg_received.collect(),
            self.msg_sent.collect(),
        ]
        .concat();
        if let Some(h) = &self.handling {
            out.extend(h.collect());
        }
        out
    }
}

/// Per-call reporter. Cheap to clone; clones report into the same series.
#[derive(Clone)]
pub struct ServerReporter {
    metrics: Arc<ServerMetrics>,
    rpc_type: RpcType,
    service: String,
    method: String,
    start: Instant,
    tracked: bool,
}

impl ServerReporter {
    fn labels(&self) -> [&str; 3] {
        [self.rpc_type.as_str(), &self.service, &self.method]
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn received_message(&self) {
        if !self.tracked {
            return;
        }
        if let Err(e) = self.metrics.msg_received.inc(&self.labels()) {
            log_dropped("grpc_server_msg_received_total", &e);
        }
    }

    pub fn sent_message(&self) {
        if !self.tracked {
            return;
        }
        if let Err(e) = self.metrics.msg_sent.inc(&self.labels()) {
            log_dropped("grpc_server_msg_sent_total", &e);
        }
    }

    /// Report completion with `code`. Codes excluded by the status patterns
    /// are not recorded.
    pub fn handled(&self, code: Code) {
        if !self.tracked
            || !self
                .metrics
                .filter
                .dimension(Dimension::Status)
                .allows(code.as_str())
        {
            return;
        }

        let [t, s, m] = self.labels();
        if let Err(e) = self.metrics.handled.inc(&[t, s, m, code.as_str()]) {
            log_dropped("grpc_server_handled_total", &e);
        }
        if let Some(h) = &self.metrics.handling {
            if let Err(e) = h.observe(&[t, s, m], self.elapsed().as_secs_f64()) {
                log_dropped("grpc_server_handling_seconds", &e);
            }
        }
    }
}
