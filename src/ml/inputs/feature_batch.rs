// ============================================================
// Layer 5: Feature Batch
// ============================================================
// The forward-call interface of every input module: a map from
// field name to an integer tensor with a leading batch dimension.
//
//   "userId"      → [B, 1]   one index per sample
//   "history"     → [B, L]   padded index sequence
//   "history_len" → [B, 1]   valid length of each sequence
//
// Lookups of unknown names surface as CtrError::MissingField.
// That is a caller error and nothing here tries to recover.

use std::collections::HashMap;

use burn::prelude::*;

use crate::error::{CtrError, CtrResult};

/// Named integer tensors for one mini-batch.
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    tensors: HashMap<String, Tensor<B, 2, Int>>,
}

impl<B: Backend> Default for FeatureBatch<B> {
    fn default() -> Self {
        Self { tensors: HashMap::new() }
    }
}

impl<B: Backend> FeatureBatch<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the tensor for `name`.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor<B, 2, Int>) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Builder form of [`FeatureBatch::insert`].
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor<B, 2, Int>) -> Self {
        self.insert(name, tensor);
        self
    }

    pub fn get(&self, name: &str) -> CtrResult<&Tensor<B, 2, Int>> {
        self.tensors
            .get(name)
            .ok_or_else(|| CtrError::MissingField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Copy of this batch holding only `names`.
    /// Every name must be present.
    pub fn restrict<S: AsRef<str>>(&self, names: &[S]) -> CtrResult<Self> {
        let mut tensors = HashMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            tensors.insert(name.to_string(), self.get(name)?.clone());
        }
        Ok(Self { tensors })
    }

    /// Batch size read from any tensor; None when the batch is empty.
    pub fn batch_size(&self) -> Option<usize> {
        self.tensors.values().next().map(|t| t.dims()[0])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ids(values: &[i32], device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, device).reshape([values.len(), 1])
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let device = Default::default();
        let batch  = FeatureBatch::<TestBackend>::new().with("userId", ids(&[1, 2], &device));

        assert!(batch.get("userId").is_ok());
        match batch.get("movieId") {
            Err(CtrError::MissingField(name)) => assert_eq!(name, "movieId"),
            other => panic!("unexpected lookup result: {other:?}"),
        }
    }

    #[test]
    fn test_restrict_keeps_only_requested_names() {
        let device = Default::default();
        let batch  = FeatureBatch::<TestBackend>::new()
            .with("userId",  ids(&[1, 2, 3], &device))
            .with("movieId", ids(&[4, 5, 6], &device))
            .with("genre",   ids(&[0, 1, 0], &device));

        let sub = batch.restrict(&["userId", "genre"]).unwrap();
        assert_eq!(sub.len(), 2);
        assert!(sub.contains("genre"));
        assert!(!sub.contains("movieId"));
        assert_eq!(sub.batch_size(), Some(3));

        assert!(batch.restrict(&["nope"]).is_err());
    }

    #[test]
    fn test_empty_batch_has_no_size() {
        let batch = FeatureBatch::<TestBackend>::new();
        assert!(batch.is_empty());
        assert_eq!(batch.batch_size(), None);
    }
}
