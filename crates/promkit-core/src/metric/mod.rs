//! Labelled metric vectors.
//!
//! Each vector owns one descriptor and a `DashMap` from label tuple to series.
//! Series values are atomics, so concurrent updates from many request tasks
//! never lose increments. Label tuples are kept in declared order; their
//! length is checked against the descriptor on every lookup.

mod atomic;
mod counter;
mod histogram;
mod summary;

pub use counter::{Counter, CounterVec};
pub use histogram::{validate_buckets, Histogram, HistogramVec, DEFAULT_BUCKETS};
pub use summary::{Summary, SummaryVec};

use std::sync::Arc;

use dashmap::DashMap;

use crate::desc::Desc;
use crate::error::{MetricsError, Result};
use crate::family::{MetricFamily, Series, Value};

/// Label tuple -> series storage shared by all vector kinds.
#[derive(Debug)]
pub(crate) struct SeriesMap<M> {
    desc: Desc,
    map: DashMap<Vec<String>, Arc<M>>,
}

impl<M> SeriesMap<M> {
    pub(crate) fn new(desc: Desc) -> Self {
        Self {
            desc,
            map: DashMap::new(),
        }
    }

    pub(crate) fn desc(&self) -> &Desc {
        &self.desc
    }

    fn check_cardinality(&self, label_values: &[&str]) -> Result<()> {
        let expected = self.desc.label_names.len();
        if label_values.len() != expected {
            return Err(MetricsError::Cardinality {
                metric: self.desc.fq_name.clone(),
                expected,
                got: label_values.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn get_or_create(
        &self,
        label_values: &[&str],
        make: impl FnOnce() -> M,
    ) -> Result<Arc<M>> {
        self.check_cardinality(label_values)?;
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();

        // Fast path: existing series, shared read lock on one shard only.
        if let Some(m) = self.map.get(&key) {
            return Ok(Arc::clone(m.value()));
        }
        let entry = self.map.entry(key).or_insert_with(|| Arc::new(make()));
        Ok(Arc::clone(entry.value()))
    }

    pub(crate) fn get(&self, label_values: &[&str]) -> Option<Arc<M>> {
        if self.check_cardinality(label_values).is_err() {
            return None;
        }
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.map.get(&key).map(|m| Arc::clone(m.value()))
    }

    pub(crate) fn snapshot(&self, value: impl Fn(&M) -> Value) -> MetricFamily {
        let mut series: Vec<Series> = self
            .map
            .iter()
            .map(|r| Series {
                label_values: r.key().clone(),
                value: value(r.value()),
            })
            .collect();
        series.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        MetricFamily {
            desc: self.desc.clone(),
            series,
        }
    }
}
