//! Exclusion filter over (status, endpoint, method).
//!
//! Each dimension holds an ordered list of regex patterns, compiled once at
//! construction. A value is excluded when any pattern of its dimension
//! matches (unanchored search). A dimension passes everything when its list
//! is empty or contains an empty pattern. A pattern that fails to compile
//! never matches; it is logged once here and the rest of its list still
//! applies.

use regex::Regex;

use crate::error::MetricsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Status,
    Endpoint,
    Method,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Status => "status",
            Dimension::Endpoint => "endpoint",
            Dimension::Method => "method",
        }
    }
}

/// Compiled patterns of one dimension.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
    pass_all: bool,
    errors: Vec<String>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(dimension: Dimension, raw: &[S]) -> Self {
        let mut set = PatternSet::default();
        for p in raw {
            let p = p.as_ref();
            if p.is_empty() {
                set.pass_all = true;
                continue;
            }
            match Regex::new(p) {
                Ok(re) => set.patterns.push(re),
                Err(e) => {
                    let err = MetricsError::InvalidPattern {
                        pattern: p.to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(
                        dimension = dimension.as_str(),
                        error = %err,
                        kind = err.kind().as_str(),
                        "exclusion pattern ignored"
                    );
                    set.errors.push(p.to_string());
                }
            }
        }
        set
    }

    /// True when `value` should be recorded.
    pub fn allows(&self, value: &str) -> bool {
        if self.pass_all {
            return true;
        }
        !self.patterns.iter().any(|re| re.is_match(value))
    }

    /// Patterns that failed to compile.
    pub fn invalid_patterns(&self) -> &[String] {
        &self.errors
    }

    pub fn is_pass_all(&self) -> bool {
        self.pass_all || self.patterns.is_empty()
    }
}

/// Per-dimension exclusion rules. `Default` excludes nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    status: PatternSet,
    endpoint: PatternSet,
    method: PatternSet,
}

impl ExclusionFilter {
    pub fn new<S: AsRef<str>>(status: &[S], endpoint: &[S], method: &[S]) -> Self {
        Self {
            status: PatternSet::compile(Dimension::Status, status),
            endpoint: PatternSet::compile(Dimension::Endpoint, endpoint),
            method: PatternSet::compile(Dimension::Method, method),
        }
    }

    pub fn dimension(&self, d: Dimension) -> &PatternSet {
        match d {
            Dimension::Status => &self.status,
            Dimension::Endpoint => &self.endpoint,
            Dimension::Method => &self.method,
        }
    }

    /// True when the observation passes all three dimensions.
    pub fn allows(&self, status: &str, endpoint: &str, method: &str) -> bool {
        self.status.allows(status) && self.endpoint.allows(endpoint) && self.method.allows(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn empty_lists_pass_everything() {
        let f = ExclusionFilter::default();
        for s in ["200", "500", "", "anything"] {
            assert!(f.allows(s, s, s));
        }
        let f = ExclusionFilter::new(NONE, NONE, NONE);
        assert!(f.allows("500", "/x", "DELETE"));
    }

    #[test]
    fn status_prefix_excludes_server_errors() {
        let f = ExclusionFilter::new(&["^5"], NONE, NONE);
        assert!(!f.allows("500", "/ping", "GET"));
        assert!(!f.allows("503", "/ping", "GET"));
        assert!(f.allows("200", "/ping", "GET"));
        assert!(f.allows("405", "/ping", "GET"));
    }

    #[test]
    fn any_matching_pattern_excludes() {
        let f = ExclusionFilter::new(NONE, &["^/metrics$", "^/health"], NONE);
        assert!(!f.allows("200", "/metrics", "GET"));
        assert!(!f.allows("200", "/healthz", "GET"));
        assert!(f.allows("200", "/metrics/extra", "GET"));
    }

    #[test]
    fn empty_pattern_disables_dimension() {
        let f = ExclusionFilter::new(NONE, NONE, &["^OPTIONS$", ""]);
        assert!(f.allows("200", "/", "OPTIONS"));
        assert!(f.dimension(Dimension::Method).is_pass_all());
    }

    #[test]
    fn malformed_pattern_is_skipped() {
        for patterns in [["^5", "(unclosed"], ["(unclosed", "^5"]] {
            let f = ExclusionFilter::new(&patterns, NONE, NONE);
            assert!(!f.allows("500", "/ping", "GET"), "{patterns:?}");
            assert!(f.allows("200", "/ping", "GET"), "{patterns:?}");
            assert_eq!(
                f.dimension(Dimension::Status).invalid_patterns(),
                &["(unclosed".to_string()]
            );
        }
    }

    #[test]
    fn only_malformed_patterns_exclude_nothing() {
        let f = ExclusionFilter::new(NONE, &["[z-a]", "(unclosed"], NONE);
        assert!(f.allows("500", "/ping", "GET"));
        assert!(f.dimension(Dimension::Endpoint).is_pass_all());
    }

    #[test]
    fn dimensions_are_independent() {
        let f = ExclusionFilter::new(&["^4"], NONE, &["^HEAD$"]);
        assert!(!f.allows("404", "/a", "GET"));
        assert!(!f.allows("200", "/a", "HEAD"));
        assert!(f.allows("200", "/a", "GET"));
    }
}
