// ============================================================
// Layer 5: Attentional Factorization Machine Model
// ============================================================
// Sums three terms into one score per sample:
//
//   ŷ = bias + Σ_fields first_order + Σ_E AFM(second_order)
//
//   first_order   [B, N, 1]   per-field linear weights
//   second_order  [B, N, E]   per-field embeddings
//   ŷ             [B, 1]
//
// The bias is a single trainable scalar drawn from U(0, 1).
//
// Reference: Xiao et al. (2017) Attentional Factorization Machines

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
};

use crate::error::CtrResult;
use crate::ml::layers::afm::{
    AttentionalFactorizationMachineLayer, AttentionalFactorizationMachineLayerConfig,
};

#[derive(Config, Debug)]
pub struct AttentionalFactorizationMachineModelConfig {
    pub embed_size: usize,
    pub num_fields: usize,
    pub attn_size:  usize,
    /// Dropout inside the AFM layer
    #[config(default = 0.0)]
    pub dropout:    f64,
}

impl AttentionalFactorizationMachineModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CtrResult<AttentionalFactorizationMachineModel<B>> {
        let afm = AttentionalFactorizationMachineLayerConfig::new(self.embed_size, self.num_fields, self.attn_size)
            .with_dropout(self.dropout)
            .init(device)?;
        let bias = Initializer::Uniform { min: 0.0, max: 1.0 }.init([1], device);
        Ok(AttentionalFactorizationMachineModel { afm, bias })
    }
}

#[derive(Module, Debug)]
pub struct AttentionalFactorizationMachineModel<B: Backend> {
    pub afm:  AttentionalFactorizationMachineLayer<B>,
    pub bias: Param<Tensor<B, 1>>,
}

/// Prediction plus the attention weights behind it.
pub struct AfmModelOutput<B: Backend> {
    /// [B, 1]
    pub prediction: Tensor<B, 2>,
    /// [B, P, 1]
    pub attention:  Tensor<B, 3>,
}

impl<B: Backend> AttentionalFactorizationMachineModel<B> {
    /// first_order: [B, N, 1], second_order: [B, N, E] → [B, 1]
    pub fn forward(&self, first_order: Tensor<B, 3>, second_order: Tensor<B, 3>) -> Tensor<B, 2> {
        self.forward_with_attention(first_order, second_order).prediction
    }

    pub fn forward_with_attention(
        &self,
        first_order:  Tensor<B, 3>,
        second_order: Tensor<B, 3>,
    ) -> AfmModelOutput<B> {
        let batch_size = first_order.dims()[0];

        // [B, N, 1] → [B, 1]
        let linear_out = first_order.sum_dim(1).reshape([batch_size, 1]);

        // [B, 1, E] → [B, 1]
        let afm    = self.afm.forward(second_order);
        let afm_out = afm.pooled.sum_dim(2).reshape([batch_size, 1]);

        let prediction = self.bias.val().unsqueeze::<2>() + linear_out + afm_out;
        AfmModelOutput { prediction, attention: afm.attention }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_prediction_shape() {
        let device = Default::default();
        let model  = AttentionalFactorizationMachineModelConfig::new(5, 3, 4)
            .init::<TestBackend>(&device)
            .unwrap();

        let first  = Tensor::<TestBackend, 3>::random([2, 3, 1], Distribution::Default, &device);
        let second = Tensor::<TestBackend, 3>::random([2, 3, 5], Distribution::Default, &device);

        let out = model.forward_with_attention(first, second);
        assert_eq!(out.prediction.dims(), [2, 1]);
        assert_eq!(out.attention.dims(), [2, 3, 1]);
    }

    #[test]
    fn test_bias_is_uniform_draw() {
        let model = AttentionalFactorizationMachineModelConfig::new(4, 2, 4)
            .init::<TestBackend>(&Default::default())
            .unwrap();
        let bias: Vec<f32> = model.bias.val().into_data().to_vec().unwrap();
        assert_eq!(bias.len(), 1);
        assert!((0.0..=1.0).contains(&bias[0]));
    }

    #[test]
    fn test_prediction_is_sum_of_terms() {
        let device = Default::default();
        let model  = AttentionalFactorizationMachineModelConfig::new(3, 2, 4)
            .init::<TestBackend>(&device)
            .unwrap();

        let first  = Tensor::<TestBackend, 3>::from_floats([[[0.5], [-0.25]]], &device);
        let second = Tensor::<TestBackend, 3>::from_floats([[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]], &device);

        // Two fields → one pair with weight 1 → Σ_E(e0 ⊙ e1) = 4 + 10 + 18
        let bias: f32 = model.bias.val().into_scalar();
        let out:  f32 = model.forward(first, second).into_scalar();
        assert!((out - (bias + 0.25 + 32.0)).abs() < 1e-4);
    }
}
