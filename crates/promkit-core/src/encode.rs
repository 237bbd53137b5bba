//! Prometheus text exposition format (version 0.0.4).
//!
//! ```text
//! # HELP service_http_request_count_total Total number of HTTP requests made.
//! # TYPE service_http_request_count_total counter
//! service_http_request_count_total{status="200",endpoint="/ping",method="GET"} 3
//! ```

use std::fmt::Write;

use crate::family::{MetricFamily, Value};

/// Content type served alongside [`encode_text`] output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Escape a label value.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape HELP text (quotes are left alone).
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a float sample or bound the way Prometheus clients do.
fn format_float(v: f64) -> String {
    if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v}")
    }
}

/// `{a="x",b="y"}` plus an optional trailing `le`; empty string when there are no labels.
fn label_block(names: &[String], values: &[String], le: Option<&str>) -> String {
    let mut parts: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{le}\""));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

/// Render families in text exposition format. Families without series only
/// emit their HELP/TYPE header.
pub fn encode_text(families: &[MetricFamily]) -> String {
    let mut out = String::with_capacity(4096);

    for family in families {
        let name = &family.desc.fq_name;
        let labels = &family.desc.label_names;

        let _ = writeln!(out, "# HELP {name} {}", escape_help(&family.desc.help));
        let _ = writeln!(out, "# TYPE {name} {}", family.desc.kind.as_str());

        for s in &family.series {
            let block = label_block(labels, &s.label_values, None);
            match &s.value {
                Value::Counter(v) => {
                    let _ = writeln!(out, "{name}{block} {v}");
                }
                Value::Histogram(h) => {
                    for &(bound, count) in &h.buckets {
                        let le = label_block(labels, &s.label_values, Some(&format_float(bound)));
                        let _ = writeln!(out, "{name}_bucket{le} {count}");
                    }
                    let inf = label_block(labels, &s.label_values, Some("+Inf"));
                    let _ = writeln!(out, "{name}_bucket{inf} {}", h.count);
                    let _ = writeln!(out, "{name}_sum{block} {}", format_float(h.sum));
                    let _ = writeln!(out, "{name}_count{block} {}", h.count);
                }
                Value::Summary { count, sum } => {
                    let _ = writeln!(out, "{name}_sum{block} {}", format_float(*sum));
                    let _ = writeln!(out, "{name}_count{block} {count}");
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::Opts;
    use crate::metric::{CounterVec, HistogramVec, SummaryVec};
    use crate::registry::Collector;

    #[test]
    fn counter_lines() {
        let c = CounterVec::new(
            Opts::new("http_request_count_total", "Total number of HTTP requests made.")
                .namespace("service"),
            &["status", "endpoint", "method"],
        )
        .expect("valid");
        c.inc(&["200", "/ping", "GET"]).expect("inc");
        c.inc(&["200", "/ping", "GET"]).expect("inc");

        let text = encode_text(&c.collect());
        assert!(text.contains(
            "# HELP service_http_request_count_total Total number of HTTP requests made.\n"
        ));
        assert!(text.contains("# TYPE service_http_request_count_total counter\n"));
        assert!(text.contains(
            "service_http_request_count_total{status=\"200\",endpoint=\"/ping\",method=\"GET\"} 2\n"
        ));
    }

    #[test]
    fn histogram_lines() {
        let h = HistogramVec::new(Opts::new("lat", "Latency"), &["method"], &[0.1, 0.5, 1.0])
            .expect("valid");
        h.observe(&["GET"], 0.05).expect("observe");
        h.observe(&["GET"], 0.3).expect("observe");

        let text = encode_text(&h.collect());
        assert!(text.contains("# TYPE lat histogram\n"));
        assert!(text.contains("lat_bucket{method=\"GET\",le=\"0.1\"} 1\n"));
        assert!(text.contains("lat_bucket{method=\"GET\",le=\"0.5\"} 2\n"));
        assert!(text.contains("lat_bucket{method=\"GET\",le=\"1\"} 2\n"));
        assert!(text.contains("lat_bucket{method=\"GET\",le=\"+Inf\"} 2\n"));
        assert!(text.contains("lat_count{method=\"GET\"} 2\n"));
    }

    #[test]
    fn summary_and_unlabelled_lines() {
        let s = SummaryVec::new(Opts::new("size_bytes", "Sizes"), &[]).expect("valid");
        s.observe(&[], 12.0).expect("observe");

        let text = encode_text(&s.collect());
        assert!(text.contains("# TYPE size_bytes summary\n"));
        assert!(text.contains("size_bytes_sum 12\n"));
        assert!(text.contains("size_bytes_count 1\n"));
    }

    #[test]
    fn label_values_are_escaped() {
        let c = CounterVec::new(Opts::new("odd_total", "x"), &["endpoint"]).expect("valid");
        c.inc(&["/a\"b\\c\nd"]).expect("inc");
        let text = encode_text(&c.collect());
        assert!(text.contains(r#"odd_total{endpoint="/a\"b\\c\nd"} 1"#));
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(5.0), "5");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
    }
}
