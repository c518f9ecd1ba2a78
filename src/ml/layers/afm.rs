// ============================================================
// Layer 5: Attentional Factorization Machine Layer
// ============================================================
// Pairwise interaction + attention pooling (Xiao et al. 2017).
//
// Input:  emb [B, N, E]
//
//   1. inner[b, p] = emb[b, row[p]] ⊙ emb[b, col[p]]     [B, P, E]
//      for every pair p = (i, j), i < j, P = N(N-1)/2
//   2. score = Linear(E→A) → ReLU → Linear(A→1)           [B, P, 1]
//      weight = dropout(softmax(score, over P))
//   3. pooled = Σ_p weight[b, p] · inner[b, p]            [B, 1, E]
//      pooled = dropout(pooled)
//
// Output: (pooled [B, 1, E], attention weights [B, P, 1])
//
// The pair order is fixed when the layer is built: i runs over
// 0..N-1 and, for each i, j runs over i+1..N. For N = 4 that is
// (0,1) (0,2) (0,3) (1,2) (1,3) (2,3).
//
// At least two fields are required; a single field has no pair
// to attend over and is rejected by `init`.
//
// Reference: Xiao et al. (2017) Attentional Factorization Machines

use burn::{
    module::Ignored,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::error::{CtrError, CtrResult};

// ─── PairIndex ────────────────────────────────────────────────────────────────
/// The C(N, 2) field pairs (i < j) in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairIndex {
    rows: Vec<usize>,
    cols: Vec<usize>,
}

impl PairIndex {
    pub fn new(num_fields: usize) -> Self {
        let num_pairs = num_fields * num_fields.saturating_sub(1) / 2;
        let mut rows  = Vec::with_capacity(num_pairs);
        let mut cols  = Vec::with_capacity(num_pairs);
        for i in 0..num_fields.saturating_sub(1) {
            for j in (i + 1)..num_fields {
                rows.push(i);
                cols.push(j);
            }
        }
        Self { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }

    fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 1, Int>, Tensor<B, 1, Int>) {
        let rows: Vec<i32> = self.rows.iter().map(|&i| i as i32).collect();
        let cols: Vec<i32> = self.cols.iter().map(|&j| j as i32).collect();
        (
            Tensor::<B, 1, Int>::from_ints(rows.as_slice(), device),
            Tensor::<B, 1, Int>::from_ints(cols.as_slice(), device),
        )
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct AttentionalFactorizationMachineLayerConfig {
    /// Embedding width E of each field
    pub embed_size: usize,
    /// Number of fields N in the input
    pub num_fields: usize,
    /// Hidden size A of the attention network
    pub attn_size:  usize,
    #[config(default = 0.1)]
    pub dropout:    f64,
}

impl AttentionalFactorizationMachineLayerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CtrResult<AttentionalFactorizationMachineLayer<B>> {
        if self.num_fields < 2 {
            return Err(CtrError::TooFewFields { num_fields: self.num_fields });
        }

        Ok(AttentionalFactorizationMachineLayer {
            attn_linear:  LinearConfig::new(self.embed_size, self.attn_size).init(device),
            attn_out:     LinearConfig::new(self.attn_size, 1).init(device),
            attn_dropout: DropoutConfig::new(self.dropout).init(),
            dropout:      DropoutConfig::new(self.dropout).init(),
            pairs:        Ignored(PairIndex::new(self.num_fields)),
            embed_size:   self.embed_size,
            num_fields:   self.num_fields,
        })
    }
}

// ─── Layer ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct AttentionalFactorizationMachineLayer<B: Backend> {
    pub attn_linear:  Linear<B>,
    pub attn_out:     Linear<B>,
    pub attn_dropout: Dropout,
    pub dropout:      Dropout,
    pairs:            Ignored<PairIndex>,
    embed_size:       usize,
    num_fields:       usize,
}

/// Pooled interaction and the attention weights that produced it.
pub struct AfmLayerOutput<B: Backend> {
    /// [B, 1, E]
    pub pooled:    Tensor<B, 3>,
    /// [B, P, 1], softmax-normalised over P
    pub attention: Tensor<B, 3>,
}

impl<B: Backend> AttentionalFactorizationMachineLayer<B> {
    pub fn pairs(&self) -> &PairIndex {
        &self.pairs.0
    }

    pub fn num_pairs(&self) -> usize {
        self.pairs.0.len()
    }

    pub fn embed_size(&self) -> usize {
        self.embed_size
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    /// emb_inputs: [B, N, E] → pooled [B, 1, E], attention [B, P, 1]
    pub fn forward(&self, emb_inputs: Tensor<B, 3>) -> AfmLayerOutput<B> {
        let (rows, cols) = self.pairs.0.to_tensors::<B>(&emb_inputs.device());

        // Element-wise product of every field pair → [B, P, E]
        let inner = emb_inputs.clone().select(1, rows) * emb_inputs.select(1, cols);

        // Attention network → one normalised weight per pair
        let scores    = relu(self.attn_linear.forward(inner.clone()));
        let scores    = self.attn_out.forward(scores);             // [B, P, 1]
        let attention = self.attn_dropout.forward(softmax(scores, 1));

        // Weighted sum over pairs, keeping the pair axis as size 1 → [B, 1, E]
        let pooled = (attention.clone() * inner).sum_dim(1);
        let pooled = self.dropout.forward(pooled);

        AfmLayerOutput { pooled, attention }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    fn layer(embed_size: usize, num_fields: usize, dropout: f64) -> AttentionalFactorizationMachineLayer<TestBackend> {
        AttentionalFactorizationMachineLayerConfig::new(embed_size, num_fields, 8)
            .with_dropout(dropout)
            .init(&Default::default())
            .unwrap()
    }

    #[test]
    fn test_pair_order_is_lexicographic() {
        let pairs: Vec<(usize, usize)> = PairIndex::new(4).pairs().collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_pair_count_is_n_choose_2() {
        for n in 0..10 {
            assert_eq!(PairIndex::new(n).len(), n * n.saturating_sub(1) / 2);
        }
        assert!(PairIndex::new(1).is_empty());
    }

    #[test]
    fn test_single_field_is_rejected() {
        let result = AttentionalFactorizationMachineLayerConfig::new(4, 1, 8)
            .init::<TestBackend>(&Default::default());
        assert!(matches!(result, Err(CtrError::TooFewFields { num_fields: 1 })));
    }

    #[test]
    fn test_output_shapes() {
        // batch=2, N=3, E=5 → pooled (2, 1, 5), attention (2, 3, 1)
        let device = Default::default();
        let afm    = layer(5, 3, 0.1);
        let emb    = Tensor::<TestBackend, 3>::random([2, 3, 5], Distribution::Normal(0.0, 1.0), &device);

        let out = afm.forward(emb);
        assert_eq!(out.pooled.dims(), [2, 1, 5]);
        assert_eq!(out.attention.dims(), [2, 3, 1]);
    }

    #[test]
    fn test_shapes_across_sizes() {
        let device = Default::default();
        for (batch, n, e) in [(1, 2, 1), (4, 5, 3), (3, 7, 2)] {
            let afm = layer(e, n, 0.0);
            let emb = Tensor::<TestBackend, 3>::random([batch, n, e], Distribution::Default, &device);
            let out = afm.forward(emb);
            assert_eq!(out.pooled.dims(), [batch, 1, e]);
            assert_eq!(out.attention.dims(), [batch, n * (n - 1) / 2, 1]);
        }
    }

    #[test]
    fn test_attention_sums_to_one_per_row() {
        // NdArray has no autodiff, so dropout is inactive here even at p = 0.5
        let device = Default::default();
        let afm    = layer(4, 5, 0.5);
        let emb    = Tensor::<TestBackend, 3>::random([3, 5, 4], Distribution::Normal(0.0, 1.0), &device);

        let sums: Vec<f32> = afm.forward(emb).attention.sum_dim(1).into_data().to_vec().unwrap();
        assert_eq!(sums.len(), 3);
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5, "attention row sums to {s}");
        }
    }

    #[test]
    fn test_two_fields_pool_their_only_interaction() {
        // With one pair the softmax weight is exactly 1,
        // so pooled == emb[:, 0] ⊙ emb[:, 1]
        let device = Default::default();
        let afm    = layer(3, 2, 0.0);
        let emb    = Tensor::<TestBackend, 3>::from_floats(
            [[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]],
            &device,
        );

        let pooled: Vec<f32> = afm.forward(emb).pooled.into_data().to_vec().unwrap();
        let expected         = [4.0, 10.0, 18.0];
        for (p, e) in pooled.iter().zip(expected) {
            assert!((p - e).abs() < 1e-4);
        }
    }
}
