//! Text exposition decode vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use promfan_core::error::FailureKind;
use promfan_core::exposition::{decode, MetricType, SampleValue};

fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn node_exporter_snippet() {
    let fams = decode(&load("node.prom")).unwrap();

    let mut names: Vec<_> = fams.keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, ["node_cpu_seconds_total", "node_load1", "node_uname_info", "up"]);

    let cpu = &fams["node_cpu_seconds_total"];
    assert_eq!(cpu.metric_type, MetricType::Counter);
    assert_eq!(cpu.help.as_deref(), Some("Seconds the CPUs spent in each mode."));
    assert_eq!(cpu.samples.len(), 3);
    assert_eq!(cpu.samples[0].label("mode"), Some("idle"));
    assert_eq!(cpu.samples[0].value, SampleValue::Counter(12345.67));
    assert_eq!(cpu.samples[2].labels.len(), 2, "trailing comma must not add a label");

    let load1 = &fams["node_load1"];
    assert_eq!(load1.samples[0].timestamp_ms, Some(1_700_000_000_000));
    assert_eq!(load1.samples[0].value, SampleValue::Gauge(0.42));

    let uname = &fams["node_uname_info"];
    assert_eq!(uname.samples[0].label("version"), Some("#1 SMP \"stable\""));

    let up = &fams["up"];
    assert_eq!(up.metric_type, MetricType::Untyped);
    assert!(up.help.is_none());
    assert!(up.samples[0].labels.is_empty());
}

#[test]
fn histogram_lines_fold_per_label_set() {
    let fams = decode(&load("histogram.prom")).unwrap();
    assert_eq!(fams.len(), 1);

    let fam = &fams["http_request_duration_seconds"];
    assert_eq!(fam.metric_type, MetricType::Histogram);
    assert_eq!(fam.samples.len(), 2);

    let api = &fam.samples[1];
    assert_eq!(api.label("handler"), Some("/api"));
    assert!(api.label("le").is_none());
    match &api.value {
        SampleValue::Histogram { buckets, sum, count } => {
            assert_eq!(buckets.len(), 3);
            assert_eq!(buckets[2].upper_bound, f64::INFINITY);
            assert_eq!(buckets[2].cumulative_count, 2.0);
            assert_eq!(*sum, 1.9);
            assert_eq!(*count, 2.0);
        }
        other => panic!("expected histogram, got {other:?}"),
    }
}

#[test]
fn histogram_grouping_ignores_label_order() {
    let fams = decode(&load("histogram_reordered_labels.prom")).unwrap();
    let fam = &fams["rpc_latency_seconds"];
    assert_eq!(fam.samples.len(), 1);

    let sample = &fam.samples[0];
    let names: Vec<_> = sample.labels.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["method", "code"], "first line's label order is kept");
    match &sample.value {
        SampleValue::Histogram { buckets, sum, count } => {
            assert_eq!(buckets.len(), 2);
            assert_eq!(buckets[1].upper_bound, f64::INFINITY);
            assert_eq!(buckets[1].cumulative_count, 5.0);
            assert_eq!(*sum, 1.5);
            assert_eq!(*count, 5.0);
        }
        other => panic!("expected histogram, got {other:?}"),
    }
}

#[test]
fn value_may_follow_closing_brace_directly() {
    let fams = decode("foo{a=\"1\"}1\nbar 2\n").unwrap();
    assert_eq!(fams["foo"].samples[0].value, SampleValue::Untyped(1.0));
    assert_eq!(fams["foo"].samples[0].label("a"), Some("1"));
    assert_eq!(fams["bar"].samples[0].value, SampleValue::Untyped(2.0));
}

#[test]
fn value_without_labels_still_needs_a_blank() {
    // `foo1` is a name with no value.
    assert!(decode("foo1\n").is_err());
}

#[test]
fn summary_quantiles_fold_into_one_sample() {
    let fams = decode(&load("summary.prom")).unwrap();
    let fam = &fams["go_gc_duration_seconds"];
    assert_eq!(fam.samples.len(), 1);
    match &fam.samples[0].value {
        SampleValue::Summary { quantiles, sum, count } => {
            assert_eq!(quantiles.len(), 3);
            assert_eq!(quantiles[1].quantile, 0.5);
            assert_eq!(quantiles[1].value, 3.4e-05);
            assert_eq!(*sum, 0.0123);
            assert_eq!(*count, 311.0);
        }
        other => panic!("expected summary, got {other:?}"),
    }
}

#[test]
fn families_without_samples_are_dropped() {
    let fams = decode(&load("help_only.prom")).unwrap();
    assert!(!fams.contains_key("orphan_total"));
    assert_eq!(fams["present"].samples.len(), 1);
}

#[test]
fn empty_body_decodes_to_nothing() {
    assert!(decode("").unwrap().is_empty());
    assert!(decode("\n\n# just a comment\n").unwrap().is_empty());
}

#[test]
fn malformed_vectors_report_line() {
    let cases = [
        ("bad_duplicate_label.prom", 1, "duplicate label"),
        ("bad_escape.prom", 1, "escape"),
        ("bad_second_type.prom", 2, "second TYPE"),
        ("bad_type_after_samples.prom", 2, "after its samples"),
        ("bad_missing_value.prom", 2, "end of line"),
        ("bad_bucket_without_le.prom", 2, "le label"),
        ("bad_value.prom", 1, "invalid sample value"),
        ("bad_unknown_type.prom", 1, "unknown metric type"),
    ];

    for (file, want_line, want_msg) in cases {
        let err = decode(&load(file)).expect_err(file);
        assert_eq!(err.kind(), FailureKind::Decode, "vector={file}");
        match err {
            promfan_core::PromfanError::Decode { line, msg } => {
                assert_eq!(line, want_line, "vector={file}");
                assert!(msg.contains(want_msg), "vector={file} msg={msg}");
            }
            other => panic!("vector={file}: unexpected error {other}"),
        }
    }
}
