// ============================================================
// Layer 5: Stacked Inputs
// ============================================================
// Routes a batch of named tensors to the embedding module of
// each schema entry and stacks the results field-wise:
//
//   entry 0 → [B, N_0, E]
//   entry 1 → [B, N_1, E]     ⇒   [B, N_0 + N_1 + ..., E]
//   ...
//
// Concatenation axis
//   Outputs are joined along the FIELD axis (dim 1), one row
//   per field, which is the layout the interaction layers
//   consume. Sharing E across entries is what makes this legal.
//
// Construction invariant
//   All entries report the same embed_size, otherwise
//   CtrError::EmbedSizeMismatch is returned from `new`. Nothing
//   about widths is checked during forward.
//
// Lookups
//   get(position)     one module
//   range(start..end) modules in that schema range
//   by_field(name)    every module whose field list has `name`

use std::ops::Range;

use burn::{module::Ignored, prelude::*};

use crate::error::{CtrError, CtrResult};
use crate::ml::inputs::{
    concat::ConcatInputs,
    feature_batch::FeatureBatch,
    schema::{InputKind, InputSlot, Inputs, InputsRef, LeafEmbeddings, SchemaEntry},
};

#[derive(Module, Debug)]
pub struct StackedInputs<B: Backend> {
    leaves:     LeafEmbeddings<B>,
    concats:    Vec<ConcatInputs<B>>,
    slots:      Ignored<Vec<InputSlot>>,
    embed_size: usize,
    num_fields: usize,
}

impl<B: Backend> StackedInputs<B> {
    pub fn new(schema: Vec<SchemaEntry<B>>) -> CtrResult<Self> {
        // The first entry fixes the shared width
        let embed_size = schema
            .first()
            .map(|entry| entry.inputs.embed_size())
            .ok_or(CtrError::EmptySchema)?;

        if let Some((position, entry)) = schema
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.inputs.embed_size() != embed_size)
        {
            return Err(CtrError::EmbedSizeMismatch {
                position,
                expected: embed_size,
                actual:   entry.inputs.embed_size(),
            });
        }

        let mut leaves  = LeafEmbeddings::empty();
        let mut concats = Vec::new();
        let mut slots   = Vec::with_capacity(schema.len());

        for (position, entry) in schema.into_iter().enumerate() {
            let slot = match entry.inputs {
                Inputs::Concat(concat) => {
                    if entry.fields.is_empty() {
                        return Err(CtrError::NoFields { position });
                    }
                    let num_fields = concat.num_fields();
                    concats.push(concat);
                    InputSlot {
                        kind:   InputKind::Concat,
                        index:  concats.len() - 1,
                        fields: entry.fields,
                        extra:  entry.extra,
                        num_fields,
                        embed_size,
                    }
                }
                inputs => leaves.register(position, SchemaEntry { inputs, ..entry })?,
            };
            slots.push(slot);
        }

        let num_fields = slots.iter().map(|s| s.num_fields).sum();
        tracing::debug!(
            "StackedInputs ready: {} entries, {} fields, embed_size={}",
            slots.len(), num_fields, embed_size,
        );

        Ok(Self { leaves, concats, slots: Ignored(slots), embed_size, num_fields })
    }

    /// Shared embedding width E.
    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    /// Field-axis size of the stacked output (ΣN_i).
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// Number of schema entries.
    pub fn len(&self) -> usize {
        self.slots.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.0.is_empty()
    }

    /// Field names of the entry at `position`.
    pub fn fields(&self, position: usize) -> Option<&[String]> {
        self.slots.0.get(position).map(|s| s.fields.as_slice())
    }

    /// Every batch name the schema reads, in schema order.
    pub fn input_names(&self) -> Vec<String> {
        self.slots.0.iter().flat_map(InputSlot::input_names).collect()
    }

    // ─── Lookups ──────────────────────────────────────────────────────────────

    /// Module registered at schema `position`.
    pub fn get(&self, position: usize) -> CtrResult<InputsRef<'_, B>> {
        let len = self.len();
        self.slots
            .0
            .get(position)
            .map(|slot| self.resolve(slot))
            .ok_or(CtrError::PositionOutOfRange { position, len })
    }

    /// Modules registered at positions `range.start..range.end`.
    pub fn range(&self, range: Range<usize>) -> CtrResult<Vec<InputsRef<'_, B>>> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(CtrError::RangeOutOfBounds { start: range.start, end: range.end, len });
        }
        Ok(self.slots.0[range].iter().map(|slot| self.resolve(slot)).collect())
    }

    /// Every module whose field list contains `name`. Empty when none does.
    pub fn by_field(&self, name: &str) -> Vec<InputsRef<'_, B>> {
        self.slots
            .0
            .iter()
            .filter(|slot| slot.fields.iter().any(|f| f == name))
            .map(|slot| self.resolve(slot))
            .collect()
    }

    fn resolve(&self, slot: &InputSlot) -> InputsRef<'_, B> {
        match slot.kind {
            InputKind::Concat => InputsRef::Concat(&self.concats[slot.index]),
            _ => self
                .leaves
                .lookup(slot)
                .unwrap_or_else(|| unreachable!("leaf slot {} has no module", slot.index)),
        }
    }

    // ─── Forward ──────────────────────────────────────────────────────────────

    /// Embed every schema entry and stack the results.
    ///
    /// Returns [B, ΣN_i, E]. A missing field name in `batch` is
    /// reported as CtrError::MissingField.
    pub fn forward(&self, batch: &FeatureBatch<B>) -> CtrResult<Tensor<B, 3>> {
        let mut outputs: Vec<Tensor<B, 3>> = Vec::with_capacity(self.slots.0.len());

        for slot in self.slots.0.iter() {
            let embedded = match slot.kind {
                InputKind::Concat => {
                    let sub_batch = batch.restrict(&slot.input_names())?;
                    self.concats[slot.index].forward(&sub_batch)?
                }
                _ => self.leaves.embed(slot, batch)?,
            };
            outputs.push(embedded);
        }

        Ok(Tensor::cat(outputs, 1))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::inputs::{
        sequence_indices::SequenceIndicesEmbeddingConfig,
        single_index::SingleIndexEmbeddingConfig,
    };

    type TestBackend = NdArray;
    type Device      = <TestBackend as Backend>::Device;

    fn column(values: &[i32], device: &Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, device).reshape([values.len(), 1])
    }

    fn user_movie_schema(device: &Device) -> Vec<SchemaEntry<TestBackend>> {
        vec![
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 4).init(device), ["userId"]),
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 4).init(device), ["movieId"]),
        ]
    }

    #[test]
    fn test_stacks_along_field_axis() {
        let device  = Default::default();
        let stacked = StackedInputs::new(user_movie_schema(&device)).unwrap();
        let batch   = FeatureBatch::new()
            .with("userId",  column(&[1, 2, 3], &device))
            .with("movieId", column(&[4, 5, 6], &device));

        let out = stacked.forward(&batch).unwrap();

        // Field axis: two single-field entries of width 4 → [B, 2, 4].
        // Stacking on the embedding axis would have given [B, 1, 8].
        assert_eq!(out.dims(), [3, 2, 4]);
        assert_ne!(out.dims(), [3, 1, 8]);
        assert_eq!(stacked.num_fields(), 2);
        assert_eq!(stacked.embed_size(), 4);
    }

    #[test]
    fn test_single_index_column_must_be_one_wide() {
        let device  = Default::default();
        let stacked = StackedInputs::new(user_movie_schema(&device)).unwrap();
        let batch   = FeatureBatch::new()
            .with("userId",  Tensor::<TestBackend, 2, Int>::from_ints([[3, 4, 5]], &device))
            .with("movieId", column(&[6], &device));

        let err = stacked.forward(&batch).unwrap_err();
        assert!(matches!(err, CtrError::FieldCountMismatch { expected: 1, actual: 3 }));
    }

    #[test]
    fn test_rows_come_from_their_own_entry() {
        let device  = Default::default();
        let stacked = StackedInputs::new(user_movie_schema(&device)).unwrap();
        let user    = column(&[7], &device);
        let movie   = column(&[2], &device);
        let batch   = FeatureBatch::new()
            .with("userId",  user.clone())
            .with("movieId", movie.clone());

        let out: Vec<f32> = stacked.forward(&batch).unwrap().into_data().to_vec().unwrap();

        let (InputsRef::SingleIndex(u), InputsRef::SingleIndex(m)) =
            (stacked.get(0).unwrap(), stacked.get(1).unwrap())
        else {
            panic!("expected single index embeddings");
        };
        let u: Vec<f32> = u.forward(user).into_data().to_vec().unwrap();
        let m: Vec<f32> = m.forward(movie).into_data().to_vec().unwrap();

        assert_eq!(&out[0..4], u.as_slice());
        assert_eq!(&out[4..8], m.as_slice());
    }

    #[test]
    fn test_embed_size_mismatch_fails_at_construction() {
        let device = Default::default();
        let result = StackedInputs::<TestBackend>::new(vec![
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 4).init(&device), ["userId"]),
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 8).init(&device), ["movieId"]),
        ]);
        assert!(matches!(
            result,
            Err(CtrError::EmbedSizeMismatch { position: 1, expected: 4, actual: 8 })
        ));
    }

    #[test]
    fn test_empty_schema_fails() {
        assert!(matches!(StackedInputs::<TestBackend>::new(Vec::new()), Err(CtrError::EmptySchema)));
    }

    #[test]
    fn test_sequence_entry_requires_length_field() {
        let device = Default::default();
        let result = StackedInputs::<TestBackend>::new(vec![
            SchemaEntry::new(SequenceIndicesEmbeddingConfig::new(10, 4).init(&device), ["history"]),
        ]);
        assert!(matches!(result, Err(CtrError::MissingExtraField { position: 0 })));
    }

    #[test]
    fn test_mixed_schema_dispatch() {
        let device = Default::default();
        let concat = ConcatInputs::new(vec![
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 2).init(&device), ["age"]),
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 2).init(&device), ["gender"]),
        ])
        .unwrap();

        let stacked = StackedInputs::<TestBackend>::new(vec![
            SchemaEntry::new(SingleIndexEmbeddingConfig::new(10, 4).init(&device), ["userId", "movieId"]),
            SchemaEntry::new(SequenceIndicesEmbeddingConfig::new(10, 4).init(&device), ["history"])
                .with_extra(["history_len"]),
            SchemaEntry::new(concat, ["age", "gender"]),
        ])
        .unwrap();
        assert_eq!(stacked.num_fields(), 4);

        let history = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 0, 0], &device)
            .reshape([2, 3]);
        let batch = FeatureBatch::new()
            .with("userId",      column(&[1, 2], &device))
            .with("movieId",     column(&[3, 4], &device))
            .with("history",     history)
            .with("history_len", column(&[3, 1], &device))
            .with("age",         column(&[5, 6], &device))
            .with("gender",      column(&[0, 1], &device));

        assert_eq!(stacked.forward(&batch).unwrap().dims(), [2, 4, 4]);
    }

    #[test]
    fn test_missing_field_is_a_caller_error() {
        let device  = Default::default();
        let stacked = StackedInputs::new(user_movie_schema(&device)).unwrap();
        let batch   = FeatureBatch::new().with("userId", column(&[1], &device));

        match stacked.forward(&batch) {
            Err(CtrError::MissingField(name)) => assert_eq!(name, "movieId"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_lookups() {
        let device  = Default::default();
        let mut schema = user_movie_schema(&device);
        schema.push(SchemaEntry::new(
            SingleIndexEmbeddingConfig::new(10, 4).init(&device),
            ["userId", "genre"],
        ));
        let stacked = StackedInputs::new(schema).unwrap();

        assert_eq!(stacked.get(2).unwrap().kind(), InputKind::SingleIndex);
        assert!(matches!(
            stacked.get(3),
            Err(CtrError::PositionOutOfRange { position: 3, len: 3 })
        ));

        assert_eq!(stacked.range(0..2).unwrap().len(), 2);
        assert_eq!(stacked.range(1..1).unwrap().len(), 0);
        assert!(matches!(stacked.range(1..4), Err(CtrError::RangeOutOfBounds { .. })));

        assert_eq!(stacked.by_field("userId").len(), 2);
        assert_eq!(stacked.by_field("genre").len(), 1);
        assert!(stacked.by_field("price").is_empty());

        assert_eq!(stacked.fields(2).unwrap(), ["userId".to_string(), "genre".to_string()]);
    }
}
