// ============================================================
// Layer 5: Concat Inputs
// ============================================================
// Runs several leaf embeddings over the same fields and joins
// their vectors side by side:
//
//   child_1 → [B, N, E_1]
//   child_2 → [B, N, E_2]          ⇒  [B, N, E_1 + E_2]
//
// The reported width is the sum of the children's widths, so a
// ConcatInputs can sit in a StackedInputs next to an ordinary
// embedding of width E_1 + E_2.
//
// Children must produce the same field count N. This is checked
// when the schema is built (from the declared fields) and again
// on every forward call (from the actual tensors), since a field
// tensor may carry more than one index column.

use burn::{module::Ignored, prelude::*};

use crate::error::{CtrError, CtrResult};
use crate::ml::inputs::{
    feature_batch::FeatureBatch,
    schema::{InputSlot, InputsRef, LeafEmbeddings, SchemaEntry},
};

#[derive(Module, Debug)]
pub struct ConcatInputs<B: Backend> {
    leaves:     LeafEmbeddings<B>,
    slots:      Ignored<Vec<InputSlot>>,
    embed_size: usize,
    num_fields: usize,
}

impl<B: Backend> ConcatInputs<B> {
    /// Build from a schema of leaf entries. Nested concat entries
    /// are rejected with `CtrError::NestedConcat`.
    pub fn new(schema: Vec<SchemaEntry<B>>) -> CtrResult<Self> {
        if schema.is_empty() {
            return Err(CtrError::EmptySchema);
        }

        let mut leaves = LeafEmbeddings::empty();
        let mut slots  = Vec::with_capacity(schema.len());
        for (position, entry) in schema.into_iter().enumerate() {
            slots.push(leaves.register(position, entry)?);
        }

        let num_fields = slots[0].num_fields;
        if let Some(bad) = slots.iter().find(|s| s.num_fields != num_fields) {
            return Err(CtrError::FieldCountMismatch { expected: num_fields, actual: bad.num_fields });
        }
        let embed_size = slots.iter().map(|s| s.embed_size).sum();

        Ok(Self { leaves, slots: Ignored(slots), embed_size, num_fields })
    }

    /// Sum of the children's embedding widths.
    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    /// Field-axis size shared by every child.
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn len(&self) -> usize {
        self.slots.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.0.is_empty()
    }

    /// Child modules in schema order.
    pub fn children(&self) -> Vec<InputsRef<'_, B>> {
        self.slots.0.iter().filter_map(|s| self.leaves.lookup(s)).collect()
    }

    /// [B, N, ΣE_i]
    pub fn forward(&self, batch: &FeatureBatch<B>) -> CtrResult<Tensor<B, 3>> {
        let mut outputs: Vec<Tensor<B, 3>> = Vec::with_capacity(self.slots.0.len());
        for slot in self.slots.0.iter() {
            let embedded = self.leaves.embed(slot, batch)?;
            if let Some(first) = outputs.first() {
                let (expected, actual) = (first.dims()[1], embedded.dims()[1]);
                if expected != actual {
                    return Err(CtrError::FieldCountMismatch { expected, actual });
                }
            }
            outputs.push(embedded);
        }
        Ok(Tensor::cat(outputs, 2))
    }
}
