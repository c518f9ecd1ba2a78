// ============================================================
// Layer 5: CTR Networks
// ============================================================
// Wires the input stackers to the AFM model so a whole
// feature batch can be scored in one call.
//
//   FeatureBatch ──► first_order  stacker (width 1) ──► [B, N, 1] ─┐
//                │                                                 ├─► AFM model ─► [B, 1]
//                └─► second_order stacker (width E) ──► [B, N, E] ─┘
//
// Both stackers are built from the same field list, so they
// always agree on N. A sequence field is one field after
// pooling and contributes its length column as an extra input.

use burn::prelude::*;

use crate::domain::field::{FieldKind, FieldSpec};
use crate::error::{CtrError, CtrResult};
use crate::ml::inputs::{
    FeatureBatch, SchemaEntry, SequenceIndicesEmbeddingConfig, SingleIndexEmbeddingConfig,
    StackedInputs,
};
use crate::ml::model::{
    AfmModelOutput, AttentionalFactorizationMachineModel, AttentionalFactorizationMachineModelConfig,
};

// ─── CtrNetwork ───────────────────────────────────────────────────────────────
/// A model that turns named feature columns into one score per sample.
/// This is the seam the trainer and the predictor are written against.
pub trait CtrNetwork<B: Backend> {
    /// batch columns: [B, L] → scores [B, 1]
    fn forward_features(&self, batch: &FeatureBatch<B>) -> CtrResult<Tensor<B, 2>>;
}

// ─── AfmNetworkConfig ─────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AfmNetworkConfig {
    pub fields:     Vec<FieldSpec>,
    pub embed_size: usize,
    pub attn_size:  usize,
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl AfmNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CtrResult<AfmNetwork<B>> {
        let first_order  = StackedInputs::new(self.schema(1, device))?;
        let second_order = StackedInputs::new(self.schema(self.embed_size, device))?;

        let model = AttentionalFactorizationMachineModelConfig::new(
            self.embed_size,
            second_order.num_fields(),
            self.attn_size,
        )
        .with_dropout(self.dropout)
        .init(device)?;

        tracing::debug!(
            "AfmNetwork: {} fields, embed_size={}, attn_size={}",
            second_order.num_fields(), self.embed_size, self.attn_size,
        );

        Ok(AfmNetwork { first_order, second_order, model })
    }

    /// One schema entry per field, every module `width` wide.
    fn schema<B: Backend>(&self, width: usize, device: &B::Device) -> Vec<SchemaEntry<B>> {
        self.fields
            .iter()
            .map(|field| match &field.kind {
                FieldKind::Categorical => SchemaEntry::new(
                    SingleIndexEmbeddingConfig::new(field.cardinality, width).init(device),
                    [field.name.clone()],
                ),
                FieldKind::Sequence { length_field, .. } => SchemaEntry::new(
                    SequenceIndicesEmbeddingConfig::new(field.cardinality, width).init(device),
                    [field.name.clone()],
                )
                .with_extra([length_field.clone()]),
            })
            .collect()
    }
}

// ─── AfmNetwork ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct AfmNetwork<B: Backend> {
    pub first_order:  StackedInputs<B>,
    pub second_order: StackedInputs<B>,
    pub model:        AttentionalFactorizationMachineModel<B>,
}

impl<B: Backend> AfmNetwork<B> {
    pub fn num_fields(&self) -> usize {
        self.second_order.num_fields()
    }

    /// Scores plus the pairwise attention weights [B, P, 1].
    pub fn forward_with_attention(&self, batch: &FeatureBatch<B>) -> CtrResult<AfmModelOutput<B>> {
        if batch.is_empty() {
            return Err(CtrError::EmptyBatch);
        }
        let first_order  = self.first_order.forward(batch)?;
        let second_order = self.second_order.forward(batch)?;

        // The attention layer only selects its precomputed pairs, so
        // extra field rows would vanish from the interaction term.
        let expected = self.model.afm.num_fields();
        for actual in [first_order.dims()[1], second_order.dims()[1]] {
            if actual != expected {
                return Err(CtrError::FieldCountMismatch { expected, actual });
            }
        }
        Ok(self.model.forward_with_attention(first_order, second_order))
    }
}

impl<B: Backend> CtrNetwork<B> for AfmNetwork<B> {
    fn forward_features(&self, batch: &FeatureBatch<B>) -> CtrResult<Tensor<B, 2>> {
        Ok(self.forward_with_attention(batch)?.prediction)
    }
}
