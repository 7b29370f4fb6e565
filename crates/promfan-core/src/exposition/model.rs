//! Structured metric-family representation.

use std::collections::HashMap;
use std::fmt;

/// Family name -> family. Names are unique within one decoded body.
pub type FamilyMap = HashMap<String, MetricFamily>;

/// Family type tag as written on `# TYPE` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Untyped,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(MetricType::Counter),
            "gauge" => Some(MetricType::Gauge),
            "histogram" => Some(MetricType::Histogram),
            "summary" => Some(MetricType::Summary),
            "untyped" => Some(MetricType::Untyped),
            _ => None,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `name="value"` pair. Order within a sample is preserved as parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelPair {
    pub name: String,
    pub value: String,
}

impl LabelPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

/// Value(s) carried by one sample. Histogram and summary samples fold all of
/// their `_bucket` / quantile / `_sum` / `_count` lines into one value.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Counter(f64),
    Gauge(f64),
    Untyped(f64),
    Histogram { buckets: Vec<Bucket>, sum: f64, count: f64 },
    Summary { quantiles: Vec<Quantile>, sum: f64, count: f64 },
}

impl SampleValue {
    /// Family type this value belongs to.
    pub fn metric_type(&self) -> MetricType {
        match self {
            SampleValue::Counter(_) => MetricType::Counter,
            SampleValue::Gauge(_) => MetricType::Gauge,
            SampleValue::Untyped(_) => MetricType::Untyped,
            SampleValue::Histogram { .. } => MetricType::Histogram,
            SampleValue::Summary { .. } => MetricType::Summary,
        }
    }

    /// Empty value of the given type, filled in line by line while decoding.
    pub(crate) fn empty(t: MetricType) -> Self {
        match t {
            MetricType::Counter => SampleValue::Counter(0.0),
            MetricType::Gauge => SampleValue::Gauge(0.0),
            MetricType::Untyped => SampleValue::Untyped(0.0),
            MetricType::Histogram => SampleValue::Histogram { buckets: Vec::new(), sum: 0.0, count: 0.0 },
            MetricType::Summary => SampleValue::Summary { quantiles: Vec::new(), sum: 0.0, count: 0.0 },
        }
    }
}

/// One labeled observation within a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Own labels. Excludes `le` / `quantile`, which live in the value.
    pub labels: Vec<LabelPair>,
    pub value: SampleValue,
    pub timestamp_ms: Option<i64>,
}

impl Sample {
    pub fn new(labels: Vec<LabelPair>, value: SampleValue) -> Self {
        Self { labels, value, timestamp_ms: None }
    }

    /// Look up the first label with this name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.value.as_str())
    }
}

/// Named group of samples sharing type and help text.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub metric_type: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            help: None,
            metric_type,
            samples: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }
}
