//! Render a `MergedResult` as exposition text, families in name order.

use std::io::Write;

use bytes::Bytes;

use promfan_core::error::{PromfanError, Result};
use promfan_core::exposition::{encode_family, MetricFamily};

use super::aggregate::MergedResult;

/// Families sorted by name, ordinal byte comparison.
pub fn sorted_families(merged: MergedResult) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = merged.into_families().collect();
    families.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    families
}

/// One encoded block per family. Stops after the first encode error, which is
/// yielded as the last item.
pub struct Chunks {
    families: std::vec::IntoIter<MetricFamily>,
    failed: bool,
}

impl Iterator for Chunks {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let family = self.families.next()?;
        let mut block = String::new();
        match encode_family(&family, &mut block) {
            Ok(()) => Some(Ok(Bytes::from(block))),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

pub fn chunks(merged: MergedResult) -> Chunks {
    Chunks {
        families: sorted_families(merged).into_iter(),
        failed: false,
    }
}

/// Write every family to `w`. Blocks written before a failing family stay
/// written.
pub fn serialize<W: Write>(merged: MergedResult, w: &mut W) -> Result<()> {
    for chunk in chunks(merged) {
        w.write_all(&chunk?)
            .map_err(|e| PromfanError::Internal(format!("write failed: {e}")))?;
    }
    Ok(())
}
