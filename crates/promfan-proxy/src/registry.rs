//! Immutable target registry, built once from validated config.

use std::sync::Arc;

use promfan_core::exposition::LabelPair;

use crate::config::TargetConfig;

/// One upstream target and the labels stamped onto everything it reports.
#[derive(Debug, Clone)]
pub struct TargetRecord {
    pub url: String,
    /// Injected labels, unique names.
    pub labels: Vec<LabelPair>,
    /// `k="v",...` form of `labels`, for log lines.
    pub rendered_labels: String,
}

impl TargetRecord {
    pub fn from_config(t: &TargetConfig) -> Self {
        let labels: Vec<LabelPair> = t
            .labels
            .iter()
            .map(|(k, v)| LabelPair::new(k.as_str(), v.as_str()))
            .collect();
        let rendered_labels = labels
            .iter()
            .map(|l| format!("{}=\"{}\"", l.name, l.value))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            url: t.url.clone(),
            labels,
            rendered_labels,
        }
    }
}

/// Read-only after startup; cloning shares the same records.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Arc<[Arc<TargetRecord>]>,
}

impl TargetRegistry {
    pub fn new(targets: &[TargetConfig]) -> Self {
        Self {
            targets: targets.iter().map(|t| Arc::new(TargetRecord::from_config(t))).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TargetRecord>> {
        self.targets.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn labels_are_rendered_in_name_order() {
        let cfg = TargetConfig {
            url: "http://a:9100/metrics".into(),
            labels: BTreeMap::from([("zone".to_string(), "b".to_string()), ("env".to_string(), "prod".to_string())]),
        };
        let rec = TargetRecord::from_config(&cfg);
        assert_eq!(rec.rendered_labels, r#"env="prod",zone="b""#);
        assert_eq!(rec.labels.len(), 2);
    }
}
