//! Proxy config loader (strict parsing).

pub mod schema;

use std::env;
use std::fs;

use promfan_core::error::{PromfanError, Result};

pub use schema::{ProxyConfig, ScrapeSection, TargetConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PROMFAN_CONFIG";

/// Resolve the config path from the environment. Missing or empty is fatal.
pub fn path_from_env() -> Result<String> {
    match env::var(CONFIG_ENV) {
        Ok(p) if !p.is_empty() => Ok(p),
        _ => Err(PromfanError::Config(format!(
            "{CONFIG_ENV} env var must be set to the path of the config file"
        ))),
    }
}

pub fn load_from_file(path: &str) -> Result<ProxyConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromfanError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ProxyConfig> {
    let cfg: ProxyConfig = serde_yaml::from_str(s)
        .map_err(|e| PromfanError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
