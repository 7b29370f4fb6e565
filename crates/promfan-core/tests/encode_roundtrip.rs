//! Encode output read back through the decoder.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use proptest::prelude::*;

use promfan_core::exposition::{decode, encode_family, LabelPair, MetricFamily, MetricType, Sample, SampleValue};

fn load(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

fn encode_all(fams: &promfan_core::exposition::FamilyMap) -> String {
    let mut names: Vec<_> = fams.keys().collect();
    names.sort();
    let mut out = String::new();
    for n in names {
        encode_family(&fams[n], &mut out).unwrap();
    }
    out
}

#[test]
fn vectors_survive_reencoding() {
    for file in ["node.prom", "histogram.prom", "summary.prom"] {
        let original = decode(&load(file)).unwrap();
        let again = decode(&encode_all(&original)).unwrap();
        assert_eq!(original, again, "vector={file}");
    }
}

#[test]
fn help_and_label_escapes_are_written() {
    let fam = MetricFamily::new("x_total", MetricType::Counter)
        .with_help("line one\nback\\slash")
        .with_sample(Sample::new(vec![LabelPair::new("path", "C:\\tmp \"q\"\n")], SampleValue::Counter(2.0)));
    let mut out = String::new();
    encode_family(&fam, &mut out).unwrap();
    assert_eq!(
        out,
        "# HELP x_total line one\\nback\\\\slash\n\
         # TYPE x_total counter\n\
         x_total{path=\"C:\\\\tmp \\\"q\\\"\\n\"} 2\n"
    );
}

#[test]
fn untyped_family_is_written_with_type_line() {
    let fams = decode("up 1\n").unwrap();
    let out = encode_all(&fams);
    assert_eq!(out, "# TYPE up untyped\nup 1\n");
}

#[test]
fn empty_family_is_rejected() {
    let fam = MetricFamily::new("nothing", MetricType::Gauge);
    let mut out = String::new();
    let err = encode_family(&fam, &mut out).unwrap_err();
    assert!(err.to_string().contains("no samples"));
    assert!(out.is_empty());
}

proptest! {
    #[test]
    fn arbitrary_label_values_round_trip(value in "[ -~\n]{0,24}") {
        let fam = MetricFamily::new("probe", MetricType::Gauge)
            .with_sample(Sample::new(vec![LabelPair::new("v", value.clone())], SampleValue::Gauge(1.0)));
        let mut out = String::new();
        encode_family(&fam, &mut out).unwrap();
        let back = decode(&out).unwrap();
        prop_assert_eq!(back["probe"].samples[0].label("v"), Some(value.as_str()));
    }
}
