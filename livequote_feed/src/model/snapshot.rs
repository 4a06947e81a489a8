//! Latest known record per instrument, folded from every streamed batch.
//!
//! The generator thread owns the random walk, so the feed loop keeps its own
//! merged copy to answer late subscribers with full records.

use std::collections::HashMap;

use livequote_common::{InstrumentId, QuoteFields, QuotePatch};

#[derive(Debug, Default)]
pub struct SnapshotCache {
    quotes: HashMap<InstrumentId, QuoteFields>,
}

impl SnapshotCache {
    /// Cache seeded with full records, e.g. `PatchGenerator::snapshot`.
    pub fn seeded(patches: &[QuotePatch]) -> Self {
        let mut cache = Self::default();
        cache.absorb(patches);
        cache
    }

    /// Merges a batch field by field, in order.
    pub fn absorb(&mut self, batch: &[QuotePatch]) {
        for patch in batch {
            self.quotes.entry(patch.id.clone()).or_default().merge(&patch.fields);
        }
    }

    /// Current records for `ids`, in the given order. Ids never streamed are
    /// skipped.
    pub fn snapshot(&self, ids: &[InstrumentId]) -> Vec<QuotePatch> {
        ids.iter()
            .filter_map(|id| {
                self.quotes.get(id).map(|fields| QuotePatch {
                    id: id.clone(),
                    fields: fields.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(id: &str, last: f64) -> QuotePatch {
        let mut patch = QuotePatch::new(id);
        patch.fields.last = Some(last);
        patch
    }

    #[test]
    fn partial_batches_keep_earlier_fields() {
        let mut seed = patch("USD1", 32.5);
        seed.fields.close = Some(32.0);
        let mut cache = SnapshotCache::seeded(&[seed]);

        cache.absorb(&[patch("USD1", 32.7), patch("EUR1", 35.1)]);
        let snapshot = cache.snapshot(&["EUR1".into(), "GBP1".into(), "USD1".into()]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id.as_str(), "EUR1");
        assert_eq!(snapshot[1].fields.last, Some(32.7));
        assert_eq!(snapshot[1].fields.close, Some(32.0));
        assert_eq!(cache.len(), 2);
    }
}
