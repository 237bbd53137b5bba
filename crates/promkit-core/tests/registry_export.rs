#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use promkit_core::{
    encode_text, CounterVec, HistogramVec, Opts, Registry, SummaryVec, Value,
};

fn labels() -> [&'static str; 3] {
    ["status", "endpoint", "method"]
}

#[test]
fn concurrent_updates_through_registry_are_exact() {
    let registry = Registry::new();
    let count = Arc::new(
        CounterVec::new(Opts::new("req_total", "requests").namespace("svc"), &labels()).unwrap(),
    );
    let size = Arc::new(
        SummaryVec::new(Opts::new("req_size_bytes", "sizes").namespace("svc"), &labels()).unwrap(),
    );
    registry.register(count.clone()).unwrap();
    registry.register(size.clone()).unwrap();

    const THREADS: usize = 12;
    const PER_THREAD: usize = 250;
    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..PER_THREAD {
                    count.inc(&["200", "/ping", "GET"]).unwrap();
                    size.observe(&["200", "/ping", "GET"], 2.0).unwrap();
                }
            });
        }
    });

    let n = (THREADS * PER_THREAD) as u64;
    let family = registry.family("svc_req_total").unwrap();
    match family.series(&["200", "/ping", "GET"]).unwrap().value {
        Value::Counter(v) => assert_eq!(v, n),
        ref other => panic!("unexpected value {other:?}"),
    }
    assert_eq!(size.get(&["200", "/ping", "GET"]), Some((n, 2.0 * n as f64)));
}

#[test]
fn scrape_while_recording_is_safe() {
    let registry = Arc::new(Registry::new());
    let hist = Arc::new(
        HistogramVec::new(Opts::new("lat_seconds", "latency"), &["method"], &[0.1, 1.0]).unwrap(),
    );
    registry.register(hist.clone()).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for i in 0..1000 {
                    hist.observe(&["GET"], (i % 3) as f64 * 0.5).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..50 {
                let text = encode_text(&registry.gather());
                assert!(text.contains("# TYPE lat_seconds histogram"));
            }
        });
    });

    let snap = hist.get(&["GET"]).unwrap();
    assert_eq!(snap.count, 4000);
    // Cumulative buckets never exceed the total count.
    assert!(snap.buckets.iter().all(|&(_, c)| c <= snap.count));
}

#[test]
fn exposition_of_a_full_registry() {
    let registry = Registry::new();
    let c = Arc::new(
        CounterVec::new(
            Opts::new("uptime", "HTTP service uptime.").namespace("service"),
            &["name"],
        )
        .unwrap(),
    );
    registry.register(c.clone()).unwrap();
    c.with_label_values(&["testing"]).unwrap().add(3);

    let text = encode_text(&registry.gather());
    assert_eq!(
        text,
        "# HELP service_uptime HTTP service uptime.\n\
         # TYPE service_uptime counter\n\
         service_uptime{name=\"testing\"} 3\n"
    );
}
