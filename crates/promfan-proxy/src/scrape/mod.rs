//! Scrape pipeline: collect (fan-out/fan-in) -> aggregate -> serialize.
//!
//! Nothing here is cached between requests; every call re-fetches every target.

pub mod aggregate;
pub mod collector;
pub mod fetch;
pub mod serialize;

use std::time::Instant;

use tracing::debug;

pub use aggregate::{aggregate, MergedResult};
pub use collector::{inject_labels, Collector, TargetScrape};
pub use fetch::{Fetcher, HttpFetcher};

/// Run the collecting and aggregating phases of one scrape.
pub async fn collect_and_merge(collector: &Collector) -> MergedResult {
    let started = Instant::now();

    let scrapes = collector.collect().await;
    let failed = scrapes.iter().filter(|s| s.outcome.is_err()).count();
    let received = scrapes.len();

    let merged = aggregate(scrapes);
    debug!(
        targets = collector.registry().len(),
        received,
        failed,
        families = merged.len(),
        samples = merged.sample_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scrape merged"
    );
    merged
}
