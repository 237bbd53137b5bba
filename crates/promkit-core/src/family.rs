//! Point-in-time snapshots handed from collectors to exporters.

use crate::desc::Desc;

/// All series of one metric at collection time.
#[derive(Debug, Clone)]
pub struct MetricFamily {
    pub desc: Desc,
    /// Sorted by label values.
    pub series: Vec<Series>,
}

/// One time series: label values in declared order plus its current value.
#[derive(Debug, Clone)]
pub struct Series {
    pub label_values: Vec<String>,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub enum Value {
    Counter(u64),
    Histogram(HistogramSnapshot),
    Summary { count: u64, sum: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper_bound, cumulative_count)` per configured boundary, excluding `+Inf`.
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

impl MetricFamily {
    /// Look up a series by its label values.
    pub fn series(&self, label_values: &[&str]) -> Option<&Series> {
        self.series.iter().find(|s| {
            s.label_values.len() == label_values.len()
                && s.label_values.iter().zip(label_values).all(|(a, b)| a == b)
        })
    }
}
