//! Owned metric registry.
//!
//! A `Registry` is constructed explicitly and shared via `Arc`; nothing is
//! registered into process-wide state. Registration happens at startup and
//! rejects name collisions, so two recorders configured with the same
//! namespace on one registry fail loudly instead of shadowing each other.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::desc::Desc;
use crate::error::{MetricsError, Result};
use crate::family::MetricFamily;

/// Anything that can describe its metrics and snapshot their values.
///
/// Both methods may be called concurrently with ongoing updates.
pub trait Collector: Send + Sync {
    /// Every descriptor this collector may emit.
    fn describe(&self) -> Vec<Desc>;
    /// Current values of every metric family.
    fn collect(&self) -> Vec<MetricFamily>;
}

impl<C: Collector + ?Sized> Collector for Arc<C> {
    fn describe(&self) -> Vec<Desc> {
        (**self).describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        (**self).collect()
    }
}

#[derive(Default)]
struct RegistryInner {
    names: HashSet<String>,
    collectors: Vec<Arc<dyn Collector>>,
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector. All-or-nothing: if any of its descriptor names is
    /// already taken (or repeated within the collector), nothing is added.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let descs = collector.describe();

        let mut inner = self
            .inner
            .write()
            .map_err(|_| MetricsError::Internal("registry lock poisoned".into()))?;

        let mut incoming: HashSet<&str> = HashSet::with_capacity(descs.len());
        for d in &descs {
            if inner.names.contains(&d.fq_name) || !incoming.insert(d.fq_name.as_str()) {
                return Err(MetricsError::DuplicateRegistration(d.fq_name.clone()));
            }
        }

        for d in &descs {
            inner.names.insert(d.fq_name.clone());
        }
        inner.collectors.push(collector);

        tracing::debug!(metrics = descs.len(), "collector registered");
        Ok(())
    }

    /// Whether a metric with this fully-qualified name is registered.
    pub fn is_registered(&self, fq_name: &str) -> bool {
        self.inner
            .read()
            .map(|g| g.names.contains(fq_name))
            .unwrap_or(false)
    }

    /// Registered metric names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.inner.read() {
            Ok(g) => g.names.iter().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Snapshot every registered collector, sorted by metric name.
    pub fn gather(&self) -> Vec<MetricFamily> {
        // Clone the collector list so collection runs without the lock held.
        let collectors: Vec<Arc<dyn Collector>> = match self.inner.read() {
            Ok(g) => g.collectors.clone(),
            Err(_) => {
                tracing::warn!("registry lock poisoned; exporting nothing");
                return Vec::new();
            }
        };

        let mut families: Vec<MetricFamily> =
            collectors.iter().flat_map(|c| c.collect()).collect();
        families.sort_by(|a, b| a.desc.fq_name.cmp(&b.desc.fq_name));
        families
    }

    /// Snapshot of one metric family by name.
    pub fn family(&self, fq_name: &str) -> Option<MetricFamily> {
        self.gather()
            .into_iter()
            .find(|f| f.desc.fq_name == fq_name)
    }
}
