#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promkit_core::ErrorKind;
use promkit_middleware::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
metrics:
  exclude:
    statuz: ["^5"] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    assert_eq!(cfg.metrics.namespace, "service");
    assert_eq!(cfg.metrics.service_name, "service");
    assert_eq!(cfg.metrics.buckets, vec![0.1, 0.3, 1.2, 5.0]);
    assert_eq!(cfg.metrics.handler_path, "/metrics");
    assert!(cfg.metrics.exclude.status.is_empty());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
metrics:
  namespace: shop
  service_name: checkout
  buckets: [0.05, 0.5, 2]
  handler_path: /internal/metrics
  exclude:
    status: ["^404$"]
    endpoint: ["^/healthz$"]
    method: ["^OPTIONS$"]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().expect("addr").port(), 9000);
    assert_eq!(cfg.metrics.namespace, "shop");
    assert_eq!(cfg.metrics.buckets, vec![0.05, 0.5, 2.0]);
    assert_eq!(cfg.metrics.exclude.endpoint, vec!["^/healthz$".to_string()]);
}

#[test]
fn rejects_bad_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nserver:\n  listen: nowhere\n",
        "version: 1\nmetrics:\n  buckets: []\n",
        "version: 1\nmetrics:\n  buckets: [1, 0.5]\n",
        "version: 1\nmetrics:\n  handler_path: metrics\n",
        "version: 1\nmetrics:\n  namespace: \"\"\n",
    ];
    for case in cases {
        let err = config::load_from_str(case).expect_err(case);
        assert_eq!(err.kind(), ErrorKind::Configuration, "{case}");
    }
}
