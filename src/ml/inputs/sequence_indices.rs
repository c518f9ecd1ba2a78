// ============================================================
// Layer 5: Sequence Indices Embedding
// ============================================================
// Embeds a padded sequence of indices (e.g. a user's recently
// watched items) and pools it into a single field.
//
//   indices [B, L] + lengths [B, 1]  →  pooled [B, 1, E]
//
// Positions at or beyond a sample's length are masked out of
// the pool, so the padding index never leaks into the result.
// Mean pooling divides by max(length, 1): an empty sequence
// pools to the zero vector instead of NaN.

use burn::{
    module::Ignored,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// How the valid positions of a sequence are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencePooling {
    Mean,
    Sum,
}

#[derive(Config, Debug)]
pub struct SequenceIndicesEmbeddingConfig {
    pub num_embeddings: usize,
    pub embed_size:     usize,
    #[config(default = "SequencePooling::Mean")]
    pub pooling:        SequencePooling,
}

impl SequenceIndicesEmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceIndicesEmbedding<B> {
        SequenceIndicesEmbedding {
            embedding:  EmbeddingConfig::new(self.num_embeddings, self.embed_size).init(device),
            pooling:    Ignored(self.pooling),
            embed_size: self.embed_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct SequenceIndicesEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
    pooling:       Ignored<SequencePooling>,
    embed_size:    usize,
}

impl<B: Backend> SequenceIndicesEmbedding<B> {
    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    pub fn pooling(&self) -> SequencePooling {
        self.pooling.0
    }

    /// indices: [B, L], lengths: [B, 1] → [B, 1, E]
    pub fn forward(&self, indices: Tensor<B, 2, Int>, lengths: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = indices.dims();
        let device   = indices.device();
        let embedded = self.embedding.forward(indices); // [B, L, E]

        // mask[b, l] = 1.0 when l < lengths[b]
        let lengths   = lengths.reshape([batch_size, 1]);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let mask = positions
            .lower(lengths.clone().expand([batch_size, seq_len]))
            .float()
            .unsqueeze_dim::<3>(2); // [B, L, 1]

        let pooled = (embedded * mask).sum_dim(1); // [B, 1, E]

        match self.pooling.0 {
            SequencePooling::Sum  => pooled,
            SequencePooling::Mean => {
                let denom = lengths.float().clamp_min(1.0).unsqueeze_dim::<3>(2); // [B, 1, 1]
                pooled / denom
            }
        }
    }
}
