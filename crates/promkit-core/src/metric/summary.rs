use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::desc::{Desc, MetricKind, Opts};
use crate::error::Result;
use crate::family::{MetricFamily, Value};
use crate::registry::Collector;

use super::atomic::AtomicF64;
use super::SeriesMap;

#[derive(Debug, Default)]
struct SummaryCore {
    count: AtomicU64,
    sum: AtomicF64,
}

/// Handle to one summary series (count and sum, no quantiles).
#[derive(Debug, Clone)]
pub struct Summary {
    core: Arc<SummaryCore>,
}

impl Summary {
    pub fn observe(&self, v: f64) {
        self.core.sum.add(v);
        self.core.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.core.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> f64 {
        self.core.sum.get()
    }
}

#[derive(Debug)]
pub struct SummaryVec {
    series: SeriesMap<SummaryCore>,
}

impl SummaryVec {
    pub fn new(opts: Opts, label_names: &[&str]) -> Result<Self> {
        let desc = Desc::new(&opts, MetricKind::Summary, label_names)?;
        Ok(Self {
            series: SeriesMap::new(desc),
        })
    }

    pub fn with_label_values(&self, label_values: &[&str]) -> Result<Summary> {
        let core = self
            .series
            .get_or_create(label_values, SummaryCore::default)?;
        Ok(Summary { core })
    }

    pub fn observe(&self, label_values: &[&str], v: f64) -> Result<()> {
        self.with_label_values(label_values)?.observe(v);
        Ok(())
    }

    /// `(count, sum)` of one series, `None` when it was never touched.
    pub fn get(&self, label_values: &[&str]) -> Option<(u64, f64)> {
        self.series
            .get(label_values)
            .map(|c| (c.count.load(Ordering::Relaxed), c.sum.get()))
    }
}

impl Collector for SummaryVec {
    fn describe(&self) -> Vec<Desc> {
        vec![self.series.desc().clone()]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        vec![self.series.snapshot(|c| Value::Summary {
            count: c.count.load(Ordering::Relaxed),
            sum: c.sum.get(),
        })]
    }
}
