//! Shared error type across promkit crates.

use thiserror::Error;

/// Coarse error categories (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Setup-time failure; fatal, returned to the caller.
    Configuration,
    /// Malformed exclusion pattern; non-fatal, the pattern is skipped.
    FilterEvaluation,
    /// Failure while updating a metric; logged and dropped.
    Recording,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION",
            ErrorKind::FilterEvaluation => "FILTER_EVALUATION",
            ErrorKind::Recording => "RECORDING",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and middleware.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("duplicate metric registration: {0}")]
    DuplicateRegistration(String),
    #[error("invalid bucket boundaries: {0}")]
    InvalidBuckets(String),
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid labels: {0}")]
    InvalidLabels(String),
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("label cardinality mismatch for {metric}: expected {expected} values, got {got}")]
    Cardinality {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map an error to its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetricsError::DuplicateRegistration(_)
            | MetricsError::InvalidBuckets(_)
            | MetricsError::InvalidName(_)
            | MetricsError::InvalidLabels(_)
            | MetricsError::BadConfig(_)
            | MetricsError::Internal(_) => ErrorKind::Configuration,
            MetricsError::InvalidPattern { .. } => ErrorKind::FilterEvaluation,
            MetricsError::Cardinality { .. } => ErrorKind::Recording,
        }
    }
}
