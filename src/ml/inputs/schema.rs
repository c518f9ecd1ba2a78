// ============================================================
// Layer 5: Input Schema
// ============================================================
// The declarative "wire format" of the input layer: an ordered
// list of (embedding module, field names, extra names) entries.
//
//   SchemaEntry::new(user_emb,    ["userId"])
//   SchemaEntry::new(history_emb, ["history"]).with_extra(["history_len"])
//
// Each module kind is a variant of `Inputs`, so the calling
// convention is chosen once when the schema is registered:
//
//   SingleIndex      forward(cat(fields))
//   SequenceIndices  forward(cat(fields), extra[0])
//   Concat           forward(batch restricted to fields + extra)
//
// Once registered, modules live in typed Vecs inside a
// `LeafEmbeddings` (or the stacker's concat list) and an
// `InputSlot` records where each schema position went.

use burn::prelude::*;

use crate::error::{CtrError, CtrResult};
use crate::ml::inputs::{
    concat::ConcatInputs,
    feature_batch::FeatureBatch,
    sequence_indices::SequenceIndicesEmbedding,
    single_index::SingleIndexEmbedding,
};

/// An embedding module waiting to be placed in a schema.
#[derive(Debug)]
pub enum Inputs<B: Backend> {
    SingleIndex(SingleIndexEmbedding<B>),
    SequenceIndices(SequenceIndicesEmbedding<B>),
    Concat(ConcatInputs<B>),
}

impl<B: Backend> Inputs<B> {
    pub fn kind(&self) -> InputKind {
        match self {
            Inputs::SingleIndex(_)     => InputKind::SingleIndex,
            Inputs::SequenceIndices(_) => InputKind::SequenceIndices,
            Inputs::Concat(_)          => InputKind::Concat,
        }
    }

    pub fn embed_size(&self) -> usize {
        match self {
            Inputs::SingleIndex(m)     => m.embed_size(),
            Inputs::SequenceIndices(m) => m.embed_size(),
            Inputs::Concat(m)          => m.embed_size(),
        }
    }
}

impl<B: Backend> From<SingleIndexEmbedding<B>> for Inputs<B> {
    fn from(m: SingleIndexEmbedding<B>) -> Self {
        Inputs::SingleIndex(m)
    }
}

impl<B: Backend> From<SequenceIndicesEmbedding<B>> for Inputs<B> {
    fn from(m: SequenceIndicesEmbedding<B>) -> Self {
        Inputs::SequenceIndices(m)
    }
}

impl<B: Backend> From<ConcatInputs<B>> for Inputs<B> {
    fn from(m: ConcatInputs<B>) -> Self {
        Inputs::Concat(m)
    }
}

/// One row of a schema.
#[derive(Debug)]
pub struct SchemaEntry<B: Backend> {
    pub inputs: Inputs<B>,
    pub fields: Vec<String>,
    pub extra:  Vec<String>,
}

impl<B: Backend> SchemaEntry<B> {
    pub fn new<I, S>(inputs: impl Into<Inputs<B>>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            extra:  Vec::new(),
        }
    }

    /// Extra positional inputs looked up by name (e.g. a sequence length field).
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra = extra.into_iter().map(Into::into).collect();
        self
    }
}

/// Calling convention tag, fixed at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    SingleIndex,
    SequenceIndices,
    Concat,
}

/// Where a schema position was stored and how to call it.
#[derive(Debug, Clone)]
pub struct InputSlot {
    pub kind:       InputKind,
    /// Index into the Vec that holds modules of this kind
    pub index:      usize,
    pub fields:     Vec<String>,
    pub extra:      Vec<String>,
    /// Field-axis size N_i of this entry's output
    pub num_fields: usize,
    pub embed_size: usize,
}

impl InputSlot {
    /// Every batch name this slot reads.
    pub fn input_names(&self) -> Vec<String> {
        self.fields.iter().chain(self.extra.iter()).cloned().collect()
    }
}

/// Borrowed view of a registered module, returned by schema lookups.
#[derive(Debug)]
pub enum InputsRef<'a, B: Backend> {
    SingleIndex(&'a SingleIndexEmbedding<B>),
    SequenceIndices(&'a SequenceIndicesEmbedding<B>),
    Concat(&'a ConcatInputs<B>),
}

impl<B: Backend> InputsRef<'_, B> {
    pub fn kind(&self) -> InputKind {
        match self {
            InputsRef::SingleIndex(_)     => InputKind::SingleIndex,
            InputsRef::SequenceIndices(_) => InputKind::SequenceIndices,
            InputsRef::Concat(_)          => InputKind::Concat,
        }
    }

    pub fn embed_size(&self) -> usize {
        match self {
            InputsRef::SingleIndex(m)     => m.embed_size(),
            InputsRef::SequenceIndices(m) => m.embed_size(),
            InputsRef::Concat(m)          => m.embed_size(),
        }
    }
}

// ─── LeafEmbeddings ───────────────────────────────────────────────────────────
/// Owner of the leaf (non-nested) embedding modules of one schema.
#[derive(Module, Debug)]
pub struct LeafEmbeddings<B: Backend> {
    pub single_index:     Vec<SingleIndexEmbedding<B>>,
    pub sequence_indices: Vec<SequenceIndicesEmbedding<B>>,
}

impl<B: Backend> LeafEmbeddings<B> {
    pub fn empty() -> Self {
        Self { single_index: Vec::new(), sequence_indices: Vec::new() }
    }

    /// Take ownership of a leaf entry and describe where it went.
    /// Concat entries are not leaves and are rejected.
    pub fn register(&mut self, position: usize, entry: SchemaEntry<B>) -> CtrResult<InputSlot> {
        if entry.fields.is_empty() {
            return Err(CtrError::NoFields { position });
        }
        let embed_size = entry.inputs.embed_size();

        let (kind, index, num_fields) = match entry.inputs {
            Inputs::SingleIndex(m) => {
                self.single_index.push(m);
                (InputKind::SingleIndex, self.single_index.len() - 1, entry.fields.len())
            }
            Inputs::SequenceIndices(m) => {
                if entry.extra.is_empty() {
                    return Err(CtrError::MissingExtraField { position });
                }
                self.sequence_indices.push(m);
                (InputKind::SequenceIndices, self.sequence_indices.len() - 1, 1)
            }
            Inputs::Concat(_) => return Err(CtrError::NestedConcat { position }),
        };

        Ok(InputSlot {
            kind,
            index,
            fields: entry.fields,
            extra:  entry.extra,
            num_fields,
            embed_size,
        })
    }

    /// Borrow the leaf module a slot points at.
    pub fn lookup(&self, slot: &InputSlot) -> Option<InputsRef<'_, B>> {
        match slot.kind {
            InputKind::SingleIndex     => self.single_index.get(slot.index).map(InputsRef::SingleIndex),
            InputKind::SequenceIndices => self.sequence_indices.get(slot.index).map(InputsRef::SequenceIndices),
            InputKind::Concat          => None,
        }
    }

    /// Run the leaf module behind `slot` on its slice of the batch.
    ///
    /// The slot's field tensors are concatenated along the field
    /// axis first, so a SingleIndex entry over ["a", "b"] sees one
    /// [B, 2] tensor. Each SingleIndex column must be [B, 1], which
    /// keeps the output field axis equal to `slot.num_fields`.
    pub fn embed(&self, slot: &InputSlot, batch: &FeatureBatch<B>) -> CtrResult<Tensor<B, 3>> {
        let mut columns = Vec::with_capacity(slot.fields.len());
        for name in &slot.fields {
            columns.push(batch.get(name)?.clone());
        }
        let indices = Tensor::cat(columns, 1);

        if slot.kind == InputKind::SingleIndex {
            let width = indices.dims()[1];
            if width != slot.num_fields {
                return Err(CtrError::FieldCountMismatch { expected: slot.num_fields, actual: width });
            }
        }

        match slot.kind {
            InputKind::SingleIndex => Ok(self.single_index[slot.index].forward(indices)),
            InputKind::SequenceIndices => {
                let lengths = batch.get(&slot.extra[0])?.clone();
                Ok(self.sequence_indices[slot.index].forward(indices, lengths))
            }
            InputKind::Concat => unreachable!("concat slots are never stored in LeafEmbeddings"),
        }
    }
}
