//! Text exposition encoder (one family at a time).

use std::fmt::Write;

use crate::error::{PromfanError, Result};

use super::model::{LabelPair, MetricFamily, Sample, SampleValue};

/// Content type for the text format this encoder writes.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// HELP text escapes backslash and newline only.
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest round-trip decimal, with the exposition spellings for the
/// non-finite values.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

/// Render one family block and append it to `out`.
///
/// The family is validated first, so on error `out` is left untouched.
pub fn encode_family(family: &MetricFamily, out: &mut String) -> Result<()> {
    validate(family)?;

    let name = family.name.as_str();
    let mut block = String::new();
    if let Some(help) = &family.help {
        let _ = writeln!(block, "# HELP {} {}", name, escape_help(help));
    }
    let _ = writeln!(block, "# TYPE {} {}", name, family.metric_type);

    for sample in &family.samples {
        match &sample.value {
            SampleValue::Counter(v) | SampleValue::Gauge(v) | SampleValue::Untyped(v) => {
                write_line(&mut block, name, "", sample, None, *v);
            }
            SampleValue::Histogram { buckets, sum, count } => {
                let mut inf_seen = false;
                for b in buckets {
                    inf_seen |= b.upper_bound == f64::INFINITY;
                    write_line(&mut block, name, "_bucket", sample, Some(("le", b.upper_bound)), b.cumulative_count);
                }
                if !inf_seen {
                    write_line(&mut block, name, "_bucket", sample, Some(("le", f64::INFINITY)), *count);
                }
                write_line(&mut block, name, "_sum", sample, None, *sum);
                write_line(&mut block, name, "_count", sample, None, *count);
            }
            SampleValue::Summary { quantiles, sum, count } => {
                for q in quantiles {
                    write_line(&mut block, name, "", sample, Some(("quantile", q.quantile)), q.value);
                }
                write_line(&mut block, name, "_sum", sample, None, *sum);
                write_line(&mut block, name, "_count", sample, None, *count);
            }
        }
    }

    out.push_str(&block);
    Ok(())
}

fn validate(family: &MetricFamily) -> Result<()> {
    if family.name.is_empty() {
        return Err(PromfanError::Encode("metric family has no name".into()));
    }
    if family.samples.is_empty() {
        return Err(PromfanError::Encode(format!("metric family {} has no samples", family.name)));
    }
    for sample in &family.samples {
        let kind = sample.value.metric_type();
        if kind != family.metric_type {
            return Err(PromfanError::Encode(format!(
                "expected {} sample in family {}, got {}",
                family.metric_type, family.name, kind
            )));
        }
    }
    Ok(())
}

fn write_line(
    out: &mut String,
    name: &str,
    suffix: &str,
    sample: &Sample,
    extra: Option<(&str, f64)>,
    value: f64,
) {
    let _ = write!(out, "{name}{suffix}");
    let extra = extra.map(|(n, v)| LabelPair::new(n, format_value(v)));
    let mut labels = sample.labels.iter().chain(extra.as_ref()).peekable();
    if labels.peek().is_some() {
        let rendered = labels
            .map(|l| format!("{}=\"{}\"", l.name, escape_label(&l.value)))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(out, "{{{rendered}}}");
    }
    let _ = write!(out, " {}", format_value(value));
    if let Some(ts) = sample.timestamp_ms {
        let _ = write!(out, " {ts}");
    }
    out.push('\n');
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exposition::model::{Bucket, MetricType};

    #[test]
    fn non_finite_values() {
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(1.0), "1");
        assert_eq!(format_value(0.25), "0.25");
    }

    #[test]
    fn histogram_gets_implicit_inf_bucket() {
        let fam = MetricFamily::new("rpc_seconds", MetricType::Histogram).with_sample(Sample::new(
            vec![LabelPair::new("svc", "a")],
            SampleValue::Histogram {
                buckets: vec![Bucket { upper_bound: 0.5, cumulative_count: 2.0 }],
                sum: 0.7,
                count: 3.0,
            },
        ));
        let mut out = String::new();
        encode_family(&fam, &mut out).unwrap();
        assert_eq!(
            out,
            "# TYPE rpc_seconds histogram\n\
             rpc_seconds_bucket{svc=\"a\",le=\"0.5\"} 2\n\
             rpc_seconds_bucket{svc=\"a\",le=\"+Inf\"} 3\n\
             rpc_seconds_sum{svc=\"a\"} 0.7\n\
             rpc_seconds_count{svc=\"a\"} 3\n"
        );
    }

    #[test]
    fn rejected_family_leaves_output_untouched() {
        let fam = MetricFamily::new("x", MetricType::Counter).with_sample(Sample::new(vec![], SampleValue::Gauge(1.0)));
        let mut out = String::from("prefix\n");
        assert!(encode_family(&fam, &mut out).is_err());
        assert_eq!(out, "prefix\n");
    }
}
