//! Text exposition decoder.
//!
//! Parsing rules:
//! - Line oriented; blank lines and plain `#` comments are skipped.
//! - `# HELP` / `# TYPE` create or annotate a family before its samples.
//! - Histogram and summary lines are folded into one `Sample` per label set.
//! - Never `unwrap()` / `expect()` / `panic!()`; every failure carries its line.

use std::collections::{HashMap, HashSet};

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, space0, space1},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult, Parser as _,
};

use crate::error::{PromfanError, Result};

use super::model::{Bucket, FamilyMap, LabelPair, MetricFamily, MetricType, Quantile, Sample, SampleValue};

const BUCKET_LABEL: &str = "le";
const QUANTILE_LABEL: &str = "quantile";

/// Decode a full exposition body into families keyed by name.
///
/// Families that only carried `# HELP` / `# TYPE` lines are dropped.
pub fn decode(text: &str) -> Result<FamilyMap> {
    let mut decoder = Decoder::default();
    for (idx, raw) in text.lines().enumerate() {
        decoder.line(idx + 1, raw)?;
    }
    Ok(decoder.finish())
}

/// Which part of a family a sample line contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRole {
    Scalar,
    Bucket,
    Quantile,
    Sum,
    Count,
}

#[derive(Default)]
struct Decoder {
    families: FamilyMap,
    typed: HashSet<String>,
    // (family, labels without le/quantile) -> index into that family's samples
    grouped: HashMap<(String, Vec<LabelPair>), usize>,
}

impl Decoder {
    fn line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim_start_matches([' ', '\t']);
        if line.is_empty() {
            return Ok(());
        }
        match line.strip_prefix('#') {
            Some(comment) => self.comment(line_no, comment),
            None => self.sample(line_no, line),
        }
    }

    fn comment(&mut self, line_no: usize, comment: &str) -> Result<()> {
        let comment = comment.trim_start_matches([' ', '\t']);
        let (keyword, rest) = split_blank(comment);
        match keyword {
            "HELP" => {
                let (name, text) = split_blank(rest);
                let name = full_metric_name(name)
                    .ok_or_else(|| PromfanError::decode(line_no, format!("invalid metric name in HELP: {name:?}")))?;
                let help = unescape_help(text)
                    .ok_or_else(|| PromfanError::decode(line_no, "invalid escape sequence in HELP text"))?;
                let family = self
                    .families
                    .entry(name.to_string())
                    .or_insert_with(|| MetricFamily::new(name, MetricType::Untyped));
                if family.help.is_some() {
                    return Err(PromfanError::decode(line_no, format!("second HELP line for {name}")));
                }
                family.help = Some(help);
                Ok(())
            }
            "TYPE" => {
                let (name, rest) = split_blank(rest);
                let name = full_metric_name(name)
                    .ok_or_else(|| PromfanError::decode(line_no, format!("invalid metric name in TYPE: {name:?}")))?;
                let (type_name, trailing) = split_blank(rest);
                if !trailing.is_empty() {
                    return Err(PromfanError::decode(line_no, "unexpected text after TYPE"));
                }
                let metric_type = MetricType::parse(type_name)
                    .ok_or_else(|| PromfanError::decode(line_no, format!("unknown metric type {type_name:?}")))?;
                if !self.typed.insert(name.to_string()) {
                    return Err(PromfanError::decode(line_no, format!("second TYPE line for {name}")));
                }
                let family = self
                    .families
                    .entry(name.to_string())
                    .or_insert_with(|| MetricFamily::new(name, metric_type));
                if !family.samples.is_empty() {
                    return Err(PromfanError::decode(line_no, format!("TYPE line for {name} after its samples")));
                }
                family.metric_type = metric_type;
                Ok(())
            }
            // Free-form comment.
            _ => Ok(()),
        }
    }

    fn sample(&mut self, line_no: usize, line: &str) -> Result<()> {
        let parsed = parse_sample_line(line).map_err(|msg| PromfanError::decode(line_no, msg))?;

        let mut seen = HashSet::with_capacity(parsed.labels.len());
        for l in &parsed.labels {
            if !seen.insert(l.name.as_str()) {
                return Err(PromfanError::decode(line_no, format!("duplicate label name {:?}", l.name)));
            }
        }

        let (family_name, role) = self.resolve(parsed.name);
        let family_name = family_name.to_string();
        let family = self
            .families
            .entry(family_name.clone())
            .or_insert_with(|| MetricFamily::new(family_name.as_str(), MetricType::Untyped));

        let mut labels = parsed.labels;
        let value = parsed.value;

        if role == LineRole::Scalar {
            let value = match family.metric_type {
                MetricType::Counter => SampleValue::Counter(value),
                MetricType::Gauge => SampleValue::Gauge(value),
                MetricType::Untyped => SampleValue::Untyped(value),
                MetricType::Histogram => {
                    return Err(PromfanError::decode(
                        line_no,
                        format!("histogram sample {} needs a _bucket, _sum or _count suffix", parsed.name),
                    ))
                }
                MetricType::Summary => {
                    return Err(PromfanError::decode(line_no, format!("summary sample {} without quantile", parsed.name)))
                }
            };
            family.samples.push(Sample {
                labels,
                value,
                timestamp_ms: parsed.timestamp_ms,
            });
            return Ok(());
        }

        // Bucket bounds and quantiles are part of the value, not the series identity.
        let mut bound = None;
        if matches!(role, LineRole::Bucket | LineRole::Quantile) {
            let label = if role == LineRole::Bucket { BUCKET_LABEL } else { QUANTILE_LABEL };
            let pos = labels
                .iter()
                .position(|l| l.name == label)
                .ok_or_else(|| PromfanError::decode(line_no, format!("{} is missing the {label} label", parsed.name)))?;
            let raw = labels.remove(pos).value;
            let parsed_bound = parse_float(&raw)
                .ok_or_else(|| PromfanError::decode(line_no, format!("invalid {label} value {raw:?}")))?;
            bound = Some(parsed_bound);
        }

        // Series identity ignores the order labels were written in.
        let mut signature = labels.clone();
        signature.sort_by(|a, b| a.name.cmp(&b.name));
        let key = (family_name, signature);
        let idx = match self.grouped.get(&key) {
            Some(idx) => *idx,
            None => {
                family
                    .samples
                    .push(Sample::new(labels, SampleValue::empty(family.metric_type)));
                let idx = family.samples.len() - 1;
                self.grouped.insert(key, idx);
                idx
            }
        };
        let Some(sample) = family.samples.get_mut(idx) else {
            return Err(PromfanError::decode(line_no, "lost track of grouped sample"));
        };
        if parsed.timestamp_ms.is_some() {
            sample.timestamp_ms = parsed.timestamp_ms;
        }

        match (&mut sample.value, role, bound) {
            (SampleValue::Histogram { buckets, .. }, LineRole::Bucket, Some(upper_bound)) => {
                buckets.push(Bucket { upper_bound, cumulative_count: value });
            }
            (SampleValue::Summary { quantiles, .. }, LineRole::Quantile, Some(quantile)) => {
                quantiles.push(Quantile { quantile, value });
            }
            (SampleValue::Histogram { sum, .. } | SampleValue::Summary { sum, .. }, LineRole::Sum, _) => *sum = value,
            (SampleValue::Histogram { count, .. } | SampleValue::Summary { count, .. }, LineRole::Count, _) => {
                *count = value
            }
            _ => return Err(PromfanError::decode(line_no, format!("unexpected sample {}", parsed.name))),
        }
        Ok(())
    }

    /// Map a sample name to its owning family and role. Suffixes only count
    /// when the base family was declared with a matching type.
    fn resolve<'a>(&self, name: &'a str) -> (&'a str, LineRole) {
        let type_of = |n: &str| self.families.get(n).map(|f| f.metric_type);

        if let Some(base) = name.strip_suffix("_bucket") {
            if type_of(base) == Some(MetricType::Histogram) {
                return (base, LineRole::Bucket);
            }
        }
        if let Some(base) = name.strip_suffix("_sum") {
            if matches!(type_of(base), Some(MetricType::Histogram | MetricType::Summary)) {
                return (base, LineRole::Sum);
            }
        }
        if let Some(base) = name.strip_suffix("_count") {
            if matches!(type_of(base), Some(MetricType::Histogram | MetricType::Summary)) {
                return (base, LineRole::Count);
            }
        }
        if type_of(name) == Some(MetricType::Summary) {
            return (name, LineRole::Quantile);
        }
        (name, LineRole::Scalar)
    }

    fn finish(mut self) -> FamilyMap {
        self.families.retain(|_, f| !f.samples.is_empty());
        self.families
    }
}

struct SampleLine<'a> {
    name: &'a str,
    labels: Vec<LabelPair>,
    value: f64,
    timestamp_ms: Option<i64>,
}

fn parse_sample_line(line: &str) -> std::result::Result<SampleLine<'_>, String> {
    let (rest, (name, labels, raw_value, raw_ts)) = sample_line(line).map_err(describe)?;
    if !rest.is_empty() {
        return Err(format!("unexpected trailing text {rest:?}"));
    }
    let value = parse_float(raw_value).ok_or_else(|| format!("invalid sample value {raw_value:?}"))?;
    let timestamp_ms = match raw_ts {
        Some(ts) => Some(ts.parse::<i64>().map_err(|_| format!("invalid timestamp {ts:?}"))?),
        None => None,
    };
    Ok(SampleLine {
        name,
        labels: labels.unwrap_or_default(),
        value,
        timestamp_ms,
    })
}

type RawSample<'a> = (&'a str, Option<Vec<LabelPair>>, &'a str, Option<&'a str>);

fn sample_line(input: &str) -> IResult<&str, RawSample<'_>> {
    let (rest, name) = metric_name(input)?;
    let (rest, labels) = opt(preceded(space0, label_set)).parse(rest)?;
    // A closing brace already separates the value.
    let (rest, value) = if labels.is_some() {
        preceded(space0, token).parse(rest)?
    } else {
        preceded(space1, token).parse(rest)?
    };
    let (rest, ts) = opt(preceded(space1, token)).parse(rest)?;
    let (rest, _) = space0(rest)?;
    Ok((rest, (name, labels, value, ts)))
}

fn metric_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_' || c == ':'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
    ))
    .parse(input)
}

fn label_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ' ' && c != '\t')(input)
}

fn label_set(input: &str) -> IResult<&str, Vec<LabelPair>> {
    delimited(
        char('{'),
        terminated(separated_list0(char(','), label_pair), pair(opt(char(',')), space0)),
        char('}'),
    )
    .parse(input)
}

fn label_pair(input: &str) -> IResult<&str, LabelPair> {
    let (rest, (name, value)) =
        separated_pair(delimited(space0, label_name, space0), char('='), preceded(space0, label_value)).parse(input)?;
    let (rest, _) = space0(rest)?;
    Ok((rest, LabelPair::new(name, value)))
}

/// Quoted label value with `\\`, `\"` and `\n` escapes.
fn label_value(input: &str) -> IResult<&str, String> {
    let (body, _) = char('"')(input)?;
    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            match c {
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                _ => return Err(nom::Err::Failure(Error::new(body.get(i..).unwrap_or(""), ErrorKind::Escaped))),
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((body.get(i + 1..).unwrap_or(""), out));
        } else {
            out.push(c);
        }
    }
    Err(nom::Err::Failure(Error::new("", ErrorKind::Char)))
}

fn describe(err: nom::Err<Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "unexpected end of line".into(),
        nom::Err::Error(e) | nom::Err::Failure(e) => match e.code {
            ErrorKind::Escaped => "invalid escape sequence in label value".into(),
            _ if e.input.is_empty() => "unexpected end of line".into(),
            _ => {
                let near: String = e.input.chars().take(24).collect();
                format!("malformed sample line near {near:?}")
            }
        },
    }
}

/// A whole string must be a valid metric name.
fn full_metric_name(s: &str) -> Option<&str> {
    match metric_name(s) {
        Ok(("", name)) => Some(name),
        _ => None,
    }
}

/// Split off the first blank-delimited word; the remainder has its leading
/// blanks removed.
fn split_blank(s: &str) -> (&str, &str) {
    match s.find([' ', '\t']) {
        Some(pos) => {
            let (head, tail) = s.split_at(pos);
            (head, tail.trim_start_matches([' ', '\t']))
        }
        None => (s, ""),
    }
}

/// HELP text allows `\\` and `\n` only.
fn unescape_help(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            _ => return None,
        }
    }
    Some(out)
}

/// Go-style float parsing: decimal, exponent, and case-insensitive `NaN` /
/// `Inf` with an optional sign.
fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn label_value_escapes() {
        let (rest, v) = label_value(r#""a\"b\\c\nd" tail"#).unwrap();
        assert_eq!(v, "a\"b\\c\nd");
        assert_eq!(rest, " tail");
    }

    #[test]
    fn label_value_rejects_unknown_escape() {
        assert!(matches!(label_value(r#""a\tb""#), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn split_blank_trims_separator_run() {
        assert_eq!(split_blank("HELP  foo bar"), ("HELP", "foo bar"));
        assert_eq!(split_blank("TYPE"), ("TYPE", ""));
    }

    #[test]
    fn special_floats() {
        assert_eq!(parse_float("+Inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("-Inf"), Some(f64::NEG_INFINITY));
        assert!(parse_float("NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("one"), None);
    }
}
