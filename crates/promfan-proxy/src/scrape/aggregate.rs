//! Merge per-target family maps into one result keyed by family name.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use promfan_core::exposition::{FamilyMap, MetricFamily};

use super::collector::TargetScrape;

/// Family name -> merged family.
///
/// A family's samples are the concatenation, in merge order, of that family's
/// samples from every contributing target. Help and type come from whichever
/// target contributed the family first; later copies' metadata is ignored.
#[derive(Debug, Default)]
pub struct MergedResult {
    families: HashMap<String, MetricFamily>,
}

impl MergedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one target's families in.
    pub fn absorb(&mut self, families: FamilyMap) {
        for (name, family) in families {
            match self.families.entry(name) {
                Entry::Occupied(mut e) => e.get_mut().samples.extend(family.samples),
                Entry::Vacant(e) => {
                    e.insert(family);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricFamily> {
        self.families.get(name)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.families.values().map(|f| f.samples.len()).sum()
    }

    pub fn into_families(self) -> impl Iterator<Item = MetricFamily> {
        self.families.into_values()
    }
}

impl FromIterator<FamilyMap> for MergedResult {
    fn from_iter<I: IntoIterator<Item = FamilyMap>>(iter: I) -> Self {
        let mut merged = MergedResult::new();
        for families in iter {
            merged.absorb(families);
        }
        merged
    }
}

/// Merge successful scrapes in the order given. Failed targets contribute
/// nothing.
pub fn aggregate(scrapes: Vec<TargetScrape>) -> MergedResult {
    scrapes.into_iter().filter_map(|s| s.outcome.ok()).collect()
}
