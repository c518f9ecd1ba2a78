// ============================================================
// Layer 5: Single Index Embedding
// ============================================================
// Looks up one dense vector per categorical index.
//
//   indices [B, N]  →  embeddings [B, N, E]
//
// N is however many index columns the schema entry passes in
// (one per field for the usual one-id-per-field layout).

use burn::{
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct SingleIndexEmbeddingConfig {
    /// Number of distinct indices (vocabulary size of the field)
    pub num_embeddings: usize,
    /// Width E of every embedding vector
    pub embed_size: usize,
}

impl SingleIndexEmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SingleIndexEmbedding<B> {
        SingleIndexEmbedding {
            embedding:  EmbeddingConfig::new(self.num_embeddings, self.embed_size).init(device),
            embed_size: self.embed_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct SingleIndexEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
    embed_size:    usize,
}

impl<B: Backend> SingleIndexEmbedding<B> {
    /// Embedding width E reported to the stacker.
    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    /// indices: [B, N] → [B, N, E]
    pub fn forward(&self, indices: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_shape_follows_index_columns() {
        let device = Default::default();
        let emb    = SingleIndexEmbeddingConfig::new(10, 4).init::<TestBackend>(&device);
        assert_eq!(emb.embed_size(), 4);

        let indices = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 5, 6], &device)
            .reshape([2, 3]);
        assert_eq!(emb.forward(indices).dims(), [2, 3, 4]);
    }

    #[test]
    fn test_same_index_gives_same_vector() {
        let device  = Default::default();
        let emb     = SingleIndexEmbeddingConfig::new(5, 3).init::<TestBackend>(&device);
        let indices = Tensor::<TestBackend, 1, Int>::from_ints([2, 2], &device).reshape([2, 1]);

        let out: Vec<f32> = emb.forward(indices).into_data().to_vec().unwrap();
        assert_eq!(&out[0..3], &out[3..6]);
    }
}
