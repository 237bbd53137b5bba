use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::desc::{Desc, MetricKind, Opts};
use crate::error::Result;
use crate::family::{MetricFamily, Value};
use crate::registry::Collector;

use super::SeriesMap;

/// Handle to one counter series.
#[derive(Debug, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Monotonic counter partitioned by label values.
#[derive(Debug)]
pub struct CounterVec {
    series: SeriesMap<AtomicU64>,
}

impl CounterVec {
    pub fn new(opts: Opts, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(&opts, MetricKind::Counter, label_names)?;
        Ok(Self {
            series: SeriesMap::new(desc),
        })
    }

    /// Fetch (creating at zero if needed) the series for `label_values`.
    pub fn with_label_values(&self, label_values: &[&str]) -> Result<Counter> {
        let value = self
            .series
            .get_or_create(label_values, || AtomicU64::new(0))?;
        Ok(Counter { value })
    }

    /// Increment by 1.
    pub fn inc(&self, label_values: &[&str]) -> Result<()> {
        self.with_label_values(label_values)?.inc();
        Ok(())
    }

    /// Current value, 0 when the series was never touched.
    pub fn get(&self, label_values: &[&str]) -> u64 {
        self.series
            .get(label_values)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

impl Collector for CounterVec {
    fn describe(&self) -> Vec<Desc> {
        vec![self.series.desc().clone()]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        vec![self
            .series
            .snapshot(|v| Value::Counter(v.load(Ordering::Relaxed)))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn vec() -> CounterVec {
        CounterVec::new(
            Opts::new("requests_total", "Total requests"),
            &["status", "endpoint", "method"],
        )
        .expect("valid counter")
    }

    #[test]
    fn counts_per_label_tuple() {
        let c = vec();
        c.inc(&["200", "/ping", "GET"]).expect("inc");
        c.inc(&["200", "/ping", "GET"]).expect("inc");
        c.inc(&["404", "/nope", "GET"]).expect("inc");

        assert_eq!(c.get(&["200", "/ping", "GET"]), 2);
        assert_eq!(c.get(&["404", "/nope", "GET"]), 1);
        assert_eq!(c.get(&["500", "/ping", "GET"]), 0);
    }

    #[test]
    fn wrong_cardinality_is_a_recording_error() {
        let c = vec();
        let err = c.inc(&["200", "/ping"]).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Recording);
        assert!(c.collect()[0].series.is_empty());
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let c = vec();
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..500 {
                        c.inc(&["200", "/ping", "GET"]).expect("inc");
                    }
                });
            }
        });
        assert_eq!(c.get(&["200", "/ping", "GET"]), 16 * 500);
    }
}
