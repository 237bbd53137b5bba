//! Metric descriptors: the immutable identity of a metric.

use crate::error::{MetricsError, Result};

/// Kind of aggregate a metric maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
    Summary,
}

impl MetricKind {
    /// Name used on `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

/// Options shared by every metric constructor.
#[derive(Debug, Clone, Default)]
pub struct Opts {
    pub namespace: String,
    pub name: String,
    pub help: String,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
            help: help.into(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// `namespace_name`, or just `name` when the namespace is empty.
    pub fn fq_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.namespace, self.name)
        }
    }
}

/// Descriptor of a registered metric. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    pub fq_name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
}

impl Desc {
    /// Validate names and build a descriptor.
    pub fn new(opts: &Opts, kind: MetricKind, label_names: &[&str]) -> Result<Self> {
        let fq_name = opts.fq_name();
        if !is_valid_metric_name(&fq_name) {
            return Err(MetricsError::InvalidName(fq_name));
        }

        let mut labels: Vec<String> = Vec::with_capacity(label_names.len());
        for &l in label_names {
            if !is_valid_label_name(l) {
                return Err(MetricsError::InvalidLabels(format!(
                    "{fq_name}: invalid label name {l:?}"
                )));
            }
            if kind == MetricKind::Histogram && l == "le" {
                return Err(MetricsError::InvalidLabels(format!(
                    "{fq_name}: \"le\" is reserved for histogram buckets"
                )));
            }
            if labels.iter().any(|x| x == l) {
                return Err(MetricsError::InvalidLabels(format!(
                    "{fq_name}: duplicate label name {l:?}"
                )));
            }
            labels.push(l.to_string());
        }

        Ok(Self {
            fq_name,
            help: opts.help.clone(),
            kind,
            label_names: labels,
        })
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, and not starting with `__` (reserved).
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
