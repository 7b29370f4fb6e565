//! Prometheus text exposition format (version 0.0.4).
//!
//! - `model`: structured metric families, the unit of merging.
//! - `decode`: text -> `FamilyMap`, one family per name.
//! - `encode`: one `MetricFamily` -> text block.
//!
//! Both directions are panic-free; malformed input is reported as
//! `PromfanError` with the offending line.

pub mod decode;
pub mod encode;
pub mod model;

pub use decode::decode;
pub use encode::{encode_family, CONTENT_TYPE};
pub use model::{Bucket, FamilyMap, LabelPair, MetricFamily, MetricType, Quantile, Sample, SampleValue};
