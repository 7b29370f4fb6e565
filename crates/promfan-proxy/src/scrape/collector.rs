//! Fan-out / fan-in over all targets.
//!
//! One spawned task per target. Every task reports exactly one `TargetScrape`
//! (success or failure) on a channel sized to the target count, so no task
//! ever waits for a consumer slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

use promfan_core::error::{PromfanError, Result};
use promfan_core::exposition::{self, FamilyMap, LabelPair};

use crate::registry::{TargetRecord, TargetRegistry};

use super::fetch::Fetcher;

/// Result of scraping one target once.
#[derive(Debug)]
pub struct TargetScrape {
    pub target: Arc<TargetRecord>,
    pub outcome: Result<FamilyMap>,
}

pub struct Collector {
    registry: TargetRegistry,
    fetcher: Arc<dyn Fetcher>,
    target_timeout: Duration,
    max_concurrency: Option<usize>,
}

impl Collector {
    pub fn new(
        registry: TargetRegistry,
        fetcher: Arc<dyn Fetcher>,
        target_timeout: Duration,
        max_concurrency: Option<usize>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            target_timeout,
            max_concurrency,
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Scrape every target concurrently and return one result per target,
    /// in completion order.
    pub async fn collect(&self) -> Vec<TargetScrape> {
        let expected = self.registry.len();
        let (tx, mut rx) = mpsc::channel::<TargetScrape>(expected.max(1));
        let permits = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));

        for target in self.registry.iter() {
            let tx = tx.clone();
            let target = Arc::clone(target);
            let fetcher = Arc::clone(&self.fetcher);
            let permits = permits.clone();
            let timeout = self.target_timeout;

            tokio::spawn(async move {
                // The semaphore is never closed.
                let _permit = match permits {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };

                let outcome = scrape_target(fetcher.as_ref(), &target, timeout).await;
                if let Err(e) = &outcome {
                    warn!(
                        url = %target.url,
                        labels = %target.rendered_labels,
                        kind = e.kind().as_str(),
                        error = %e,
                        "failed to fetch metrics from target"
                    );
                }
                let _ = tx.send(TargetScrape { target, outcome }).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(expected);
        while let Some(r) = rx.recv().await {
            results.push(r);
        }
        if results.len() < expected {
            warn!(
                expected,
                received = results.len(),
                "target tasks ended without reporting; their metrics are missing"
            );
        }
        results
    }
}

async fn scrape_target(fetcher: &dyn Fetcher, target: &TargetRecord, timeout: Duration) -> Result<FamilyMap> {
    let body = tokio::time::timeout(timeout, fetcher.fetch(&target.url))
        .await
        .map_err(|_| PromfanError::Timeout(timeout.as_millis() as u64))??;

    let mut families = exposition::decode(&body)?;
    inject_labels(&mut families, &target.labels);
    Ok(families)
}

/// Append every target label to every sample. A name that already exists on
/// the sample is appended anyway, leaving two pairs with that name.
pub fn inject_labels(families: &mut FamilyMap, labels: &[LabelPair]) {
    if labels.is_empty() {
        return;
    }
    for family in families.values_mut() {
        for sample in &mut family.samples {
            sample.labels.extend(labels.iter().cloned());
        }
    }
}
