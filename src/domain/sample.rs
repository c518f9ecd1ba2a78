// ============================================================
// Layer 3: CtrSample Domain Type
// ============================================================
// One impression from a click log. Every feature column is a
// list of integer ids so single-valued and multi-valued
// fields share one representation:
//
//   userId      → [17]
//   movieId     → [203]
//   history     → [5, 88, 203]
//   history_len → [3]
//
// The label is 1.0 for a click and 0.0 otherwise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CtrSample {
    /// Field name → ids. BTreeMap keeps column order stable across samples.
    pub features: BTreeMap<String, Vec<i64>>,
    pub label:    f32,
}

impl CtrSample {
    pub fn new(label: f32) -> Self {
        Self { features: BTreeMap::new(), label }
    }

    pub fn with_field(mut self, name: impl Into<String>, ids: Vec<i64>) -> Self {
        self.features.insert(name.into(), ids);
        self
    }

    pub fn field(&self, name: &str) -> Option<&[i64]> {
        self.features.get(name).map(Vec::as_slice)
    }

    pub fn is_click(&self) -> bool {
        self.label >= 0.5
    }
}
