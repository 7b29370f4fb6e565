use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use promfan_core::error::{PromfanError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub scrape: ScrapeSection,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl ProxyConfig {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.targets.is_empty() {
            return Err(PromfanError::Config("targets must not be empty".into()));
        }

        self.scrape.validate()?;
        for (i, t) in self.targets.iter().enumerate() {
            t.validate()
                .map_err(|e| PromfanError::Config(format!("targets[{i}]: {}", strip_prefix(&e))))?;
        }

        Ok(())
    }

    /// Bind address in `host:port` form. The host may be a name, resolved at
    /// bind time; an empty host (`:9001`) means every interface.
    pub fn listen_addr(&self) -> Result<String> {
        let invalid = || PromfanError::Config(format!("listen must be host:port, got {:?}", self.listen));
        let (host, port) = self.listen.rsplit_once(':').ok_or_else(invalid)?;
        port.parse::<u16>().map_err(|_| invalid())?;
        if host.contains(char::is_whitespace) {
            return Err(invalid());
        }
        let host = if host.is_empty() { "0.0.0.0" } else { host };
        Ok(format!("{host}:{port}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeSection {
    /// Deadline for one target's fetch, body included.
    #[serde(default = "default_target_timeout_ms")]
    pub target_timeout_ms: u64,

    /// Cap on in-flight target fetches per scrape. Unset means unbounded.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            target_timeout_ms: default_target_timeout_ms(),
            max_concurrency: None,
        }
    }
}

impl ScrapeSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=300_000).contains(&self.target_timeout_ms) {
            return Err(PromfanError::Config(
                "scrape.target_timeout_ms must be between 100 and 300000".into(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(PromfanError::Config("scrape.max_concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn target_timeout(&self) -> Duration {
        Duration::from_millis(self.target_timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:9001".into()
}
fn default_target_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub url: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl TargetConfig {
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.url)
            .map_err(|e| PromfanError::Config(format!("invalid url {:?}: {e}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PromfanError::Config(format!("url {:?} must use http or https", self.url)));
        }
        for name in self.labels.keys() {
            if !is_label_name(name) {
                return Err(PromfanError::Config(format!("invalid label name {name:?}")));
            }
            if name.starts_with("__") {
                return Err(PromfanError::Config(format!("label name {name:?} is reserved")));
            }
        }
        Ok(())
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn strip_prefix(e: &PromfanError) -> String {
    match e {
        PromfanError::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}
