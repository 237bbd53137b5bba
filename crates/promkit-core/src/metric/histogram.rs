use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::desc::{Desc, MetricKind, Opts};
use crate::error::{MetricsError, Result};
use crate::family::{HistogramSnapshot, MetricFamily, Value};
use crate::registry::Collector;

use super::atomic::AtomicF64;
use super::SeriesMap;

/// Default latency buckets in seconds (the Prometheus client defaults).
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug)]
struct HistogramCore {
    bounds: Arc<[f64]>,
    // Cumulative: index i counts observations <= bounds[i].
    buckets: Box<[AtomicU64]>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl HistogramCore {
    fn new(bounds: Arc<[f64]>) -> Self {
        let buckets = bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            buckets,
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
        }
    }

    fn observe(&self, v: f64) {
        for (i, &b) in self.bounds.iter().enumerate() {
            if v <= b {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
        self.sum.add(v);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: self
                .bounds
                .iter()
                .zip(self.buckets.iter())
                .map(|(&b, c)| (b, c.load(Ordering::Relaxed)))
                .collect(),
            count: self.count.load(Ordering::Relaxed),
            sum: self.sum.get(),
        }
    }
}

/// Handle to one histogram series.
#[derive(Debug, Clone)]
pub struct Histogram {
    core: Arc<HistogramCore>,
}

impl Histogram {
    pub fn observe(&self, v: f64) {
        self.core.observe(v);
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.core.snapshot()
    }
}

/// Fixed-bucket distribution partitioned by label values.
#[derive(Debug)]
pub struct HistogramVec {
    bounds: Arc<[f64]>,
    series: SeriesMap<HistogramCore>,
}

impl HistogramVec {
    /// `buckets` must be non-empty and strictly increasing. A trailing `+Inf`
    /// is implicit and dropped if given.
    pub fn new(opts: Opts, label_names: &[&str], buckets: &[f64]) -> Result<Self> {
        let desc = Desc::new(&opts, MetricKind::Histogram, label_names)?;
        let bounds = validate_buckets(buckets)?;
        Ok(Self {
            bounds: bounds.into(),
            series: SeriesMap::new(desc),
        })
    }

    pub fn buckets(&self) -> &[f64] {
        &self.bounds
    }

    pub fn with_label_values(&self, label_values: &[&str]) -> Result<Histogram> {
        let bounds = Arc::clone(&self.bounds);
        let core = self
            .series
            .get_or_create(label_values, || HistogramCore::new(bounds))?;
        Ok(Histogram { core })
    }

    pub fn observe(&self, label_values: &[&str], v: f64) -> Result<()> {
        self.with_label_values(label_values)?.observe(v);
        Ok(())
    }

    /// Snapshot of one series, `None` when it was never touched.
    pub fn get(&self, label_values: &[&str]) -> Option<HistogramSnapshot> {
        self.series.get(label_values).map(|c| c.snapshot())
    }
}

impl Collector for HistogramVec {
    fn describe(&self) -> Vec<Desc> {
        vec![self.series.desc().clone()]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        vec![self.series.snapshot(|c| Value::Histogram(c.snapshot()))]
    }
}

/// Check bucket edges: non-empty, no NaN, strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> Result<Vec<f64>> {
    let mut out: Vec<f64> = buckets.to_vec();
    if out.last() == Some(&f64::INFINITY) {
        out.pop();
    }
    if out.is_empty() {
        return Err(MetricsError::InvalidBuckets(
            "at least one finite bucket is required".into(),
        ));
    }
    if out.iter().any(|b| b.is_nan()) {
        return Err(MetricsError::InvalidBuckets("NaN boundary".into()));
    }
    for w in out.windows(2) {
        if w[0] >= w[1] {
            return Err(MetricsError::InvalidBuckets(format!(
                "boundaries must be strictly increasing ({} >= {})",
                w[0], w[1]
            )));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn latency() -> HistogramVec {
        HistogramVec::new(
            Opts::new("http_request_duration_seconds", "latency"),
            &["method"],
            &[0.1, 0.3, 1.2, 5.0],
        )
        .expect("valid histogram")
    }

    #[test]
    fn observation_lands_in_cumulative_buckets() {
        let h = latency();
        h.observe(&["GET"], 0.25).expect("observe");

        let snap = h.get(&["GET"]).expect("series exists");
        assert_eq!(
            snap.buckets,
            vec![(0.1, 0), (0.3, 1), (1.2, 1), (5.0, 1)]
        );
        assert_eq!(snap.count, 1);
        assert!((snap.sum - 0.25).abs() < 1e-12);
    }

    #[test]
    fn value_above_every_bound_only_counts() {
        let h = latency();
        h.observe(&["GET"], 7.0).expect("observe");
        let snap = h.get(&["GET"]).expect("series exists");
        assert!(snap.buckets.iter().all(|&(_, c)| c == 0));
        assert_eq!(snap.count, 1);
    }

    #[test]
    fn boundary_value_is_inclusive() {
        let h = latency();
        h.observe(&["GET"], 0.1).expect("observe");
        assert_eq!(h.get(&["GET"]).expect("series").buckets[0], (0.1, 1));
    }

    #[test]
    fn rejects_non_increasing_buckets() {
        let cases: [&[f64]; 4] = [&[0.1, 0.1], &[1.0, 0.5], &[], &[f64::NAN]];
        for bad in cases {
            let err = HistogramVec::new(Opts::new("h", "h"), &[], bad).expect_err("must fail");
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn trailing_inf_is_implicit() {
        let h = HistogramVec::new(Opts::new("h", "h"), &[], &[1.0, f64::INFINITY])
            .expect("valid");
        assert_eq!(h.buckets(), &[1.0]);
    }
}
