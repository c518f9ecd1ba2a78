// ============================================================
// Layer 4: CTR Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<CtrSample>
// into one FeatureBatch plus a label column.
//
// Every field becomes a [batch_size, width] Int tensor where
// width is the longest id list for that field in this batch.
// Shorter lists are right-padded with index 0:
//
//   history: [5, 8, 2]   →   [5, 8, 2]
//            [7]             [7, 0, 0]
//
// A field absent from a sample is all padding for that row.
// Ids must fit in i32; a larger id is padded and warned about.
// Labels are [batch_size, 1] floats.
//
// Reference: Burn Book §4 (Batcher)

use std::collections::BTreeSet;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::CtrSample;
use crate::ml::inputs::FeatureBatch;

const PAD_INDEX: i32 = 0;

// ─── CtrBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct CtrBatch<B: Backend> {
    /// Field name → [batch_size, width] ids
    pub features: FeatureBatch<B>,
    /// Click labels, shape [batch_size, 1]
    pub labels:   Tensor<B, 2>,
}

// ─── CtrBatcher ───────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct CtrBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> CtrBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn column(&self, items: &[CtrSample], name: &str) -> Tensor<B, 2, Int> {
        let batch_size = items.len();
        let width = items
            .iter()
            .map(|s| s.field(name).map_or(0, <[i64]>::len))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut flat: Vec<i32> = Vec::with_capacity(batch_size * width);
        for sample in items {
            let ids = sample.field(name).unwrap_or(&[]);
            flat.extend(ids.iter().map(|&id| {
                i32::try_from(id).unwrap_or_else(|_| {
                    tracing::warn!("id {} in '{}' does not fit in i32, padding it", id, name);
                    PAD_INDEX
                })
            }));
            flat.extend(std::iter::repeat(PAD_INDEX).take(width - ids.len()));
        }

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([batch_size, width])
    }
}

impl<B: Backend> Batcher<CtrSample, CtrBatch<B>> for CtrBatcher<B> {
    fn batch(&self, items: Vec<CtrSample>) -> CtrBatch<B> {
        let batch_size = items.len();

        // Union of columns so a sample missing a field does not drop it
        let names: BTreeSet<&str> = items
            .iter()
            .flat_map(|s| s.features.keys().map(String::as_str))
            .collect();

        let mut features = FeatureBatch::new();
        for name in names {
            features.insert(name, self.column(&items, name));
        }

        let labels: Vec<f32> = items.iter().map(|s| s.label).collect();
        let labels = Tensor::<B, 1>::from_floats(labels.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        CtrBatch { features, labels }
    }
}
