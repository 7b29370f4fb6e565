//! Shared application state for the proxy.
//!
//! Built once at startup and handed to the router; request handlers only
//! ever read it.

use std::sync::Arc;

use promfan_core::error::Result;

use crate::config::ProxyConfig;
use crate::registry::TargetRegistry;
use crate::scrape::{Collector, Fetcher, HttpFetcher};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ProxyConfig,
    collector: Collector,
}

impl AppState {
    /// Build application state with the HTTP fetcher.
    /// Returns Result so main can report errors without panicking.
    pub fn new(cfg: ProxyConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new()?;
        Ok(Self::with_fetcher(cfg, Arc::new(fetcher)))
    }

    /// Build application state around any fetcher implementation.
    pub fn with_fetcher(cfg: ProxyConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let registry = TargetRegistry::new(&cfg.targets);
        let collector = Collector::new(
            registry,
            fetcher,
            cfg.scrape.target_timeout(),
            cfg.scrape.max_concurrency,
        );
        Self {
            inner: Arc::new(AppStateInner { cfg, collector }),
        }
    }

    pub fn cfg(&self) -> &ProxyConfig {
        &self.inner.cfg
    }

    pub fn collector(&self) -> &Collector {
        &self.inner.collector
    }
}
