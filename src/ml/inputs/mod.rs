// ============================================================
// Layer 5: Embedding Inputs
// ============================================================
// Turns raw named index tensors into the [B, N, E] layout the
// interaction layers expect.
//
//   feature_batch.rs     name → [B, L] int tensor map
//   single_index.rs      one embedding per index      [B, N, E]
//   sequence_indices.rs  pooled index sequence        [B, 1, E]
//   concat.rs            leaf embeddings side by side [B, N, ΣE]
//   schema.rs            schema entries, kind tags, leaf storage
//   stacked.rs           schema-driven field-wise stacking

pub mod feature_batch;
pub mod single_index;
pub mod sequence_indices;
pub mod concat;
pub mod schema;
pub mod stacked;

pub use concat::ConcatInputs;
pub use feature_batch::FeatureBatch;
pub use schema::{InputKind, Inputs, InputsRef, SchemaEntry};
pub use sequence_indices::{SequenceIndicesEmbedding, SequenceIndicesEmbeddingConfig, SequencePooling};
pub use single_index::{SingleIndexEmbedding, SingleIndexEmbeddingConfig};
pub use stacked::StackedInputs;
