// ============================================================
// Layer 5: Bilinear Network Layer
// ============================================================
// A stack of bilinear transforms with a residual back to the
// flattened input at every step:
//
//   x_0 = flatten(emb)                            [B, I]
//   x_k = bilinear_k(x_0, x_{k-1}) + x_0          k = 1..num_layers
//
//   bilinear(a, b)_o = aᵀ · W[o] · b + bias[o]    W: [I, I, I]
//
// Sizing: exactly one of
//   - embed_size AND num_fields  (I = N·E)
//   - inputs_size alone          (I given directly)
// Any other combination is CtrError::InvalidSizing.
//
// `Bilinear` below is a matmul over the reshaped weight;
// autodiff handles the gradients.

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
};

use crate::error::{CtrError, CtrResult};

// ─── Bilinear ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Bilinear<B: Backend> {
    /// [out, in1, in2]
    pub weight: Param<Tensor<B, 3>>,
    /// [out]
    pub bias:   Param<Tensor<B, 1>>,
}

impl<B: Backend> Bilinear<B> {
    /// Weights and bias drawn from U(-1/√in1, 1/√in1).
    pub fn new(in1: usize, in2: usize, out: usize, device: &B::Device) -> Self {
        let bound = 1.0 / (in1 as f64).sqrt();
        let init  = Initializer::Uniform { min: -bound, max: bound };
        Self {
            weight: init.init([out, in1, in2], device),
            bias:   init.init([out], device),
        }
    }

    /// x1: [B, in1], x2: [B, in2] → [B, out]
    pub fn forward(&self, x1: Tensor<B, 2>, x2: Tensor<B, 2>) -> Tensor<B, 2> {
        let [out, in1, in2] = self.weight.val().dims();
        let batch_size      = x1.dims()[0];

        // t[b, o, j] = Σ_i x1[b, i] · W[o, i, j]
        let weight = self.weight.val().swap_dims(0, 1).reshape([in1, out * in2]);
        let t      = x1.matmul(weight).reshape([batch_size, out, in2]);

        // y[b, o] = Σ_j t[b, o, j] · x2[b, j]
        let y = (t * x2.unsqueeze_dim::<3>(1)).sum_dim(2).reshape([batch_size, out]);
        y + self.bias.val().unsqueeze::<2>()
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct BilinearNetworkLayerConfig {
    /// Number of stacked bilinear transforms
    pub num_layers:  usize,
    /// Embedding width E (requires num_fields)
    pub embed_size:  Option<usize>,
    /// Number of fields N (requires embed_size)
    pub num_fields:  Option<usize>,
    /// Flattened input size I (excludes embed_size / num_fields)
    pub inputs_size: Option<usize>,
}

impl BilinearNetworkLayerConfig {
    /// Resolve the flattened input size I from whichever sizing scheme was given.
    pub fn resolved_inputs_size(&self) -> CtrResult<usize> {
        match (self.embed_size, self.num_fields, self.inputs_size) {
            (Some(e), Some(n), None) => Ok(e * n),
            (None, None, Some(i))    => Ok(i),
            (embed_size, num_fields, inputs_size) => Err(CtrError::InvalidSizing {
                embed_size,
                num_fields,
                inputs_size,
            }),
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CtrResult<BilinearNetworkLayer<B>> {
        let inputs_size = self.resolved_inputs_size()?;
        let layers = (0..self.num_layers)
            .map(|_| Bilinear::new(inputs_size, inputs_size, inputs_size, device))
            .collect();
        Ok(BilinearNetworkLayer { layers, inputs_size })
    }
}

// ─── Layer ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct BilinearNetworkLayer<B: Backend> {
    pub layers:  Vec<Bilinear<B>>,
    inputs_size: usize,
}

impl<B: Backend> BilinearNetworkLayer<B> {
    pub fn inputs_size(&self) -> usize {
        self.inputs_size
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// emb_inputs: [B, N, E] or [B, 1, I] → [B, 1, I]
    pub fn forward(&self, emb_inputs: Tensor<B, 3>) -> Tensor<B, 3> {
        let batch_size = emb_inputs.dims()[0];
        let x0         = emb_inputs.reshape([batch_size, self.inputs_size]);

        let mut outputs = x0.clone();
        for layer in &self.layers {
            outputs = layer.forward(x0.clone(), outputs) + x0.clone();
        }

        outputs.unsqueeze_dim(1)
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
    fn test_sizing_schemes() {
        let by_fields = BilinearNetworkLayerConfig::new(2)
            .with_embed_size(Some(4))
            .with_num_fields(Some(3));
        assert_eq!(by_fields.resolved_inputs_size().unwrap(), 12);

        let by_inputs = BilinearNetworkLayerConfig::new(2).with_inputs_size(Some(7));
        assert_eq!(by_inputs.resolved_inputs_size().unwrap(), 7);
    }

    #[test]
    fn test_both_schemes_is_an_error() {
        let cfg = BilinearNetworkLayerConfig::new(1)
            .with_embed_size(Some(4))
            .with_num_fields(Some(3))
            .with_inputs_size(Some(12));
        assert!(matches!(
            cfg.init::<TestBackend>(&Default::default()),
            Err(CtrError::InvalidSizing { .. })
        ));
    }

    #[test]
    fn test_neither_scheme_is_an_error() {
        let cfg = BilinearNetworkLayerConfig::new(1);
        assert!(matches!(
            cfg.init::<TestBackend>(&Default::default()),
            Err(CtrError::InvalidSizing { embed_size: None, num_fields: None, inputs_size: None })
        ));
    }

    #[test]
    fn test_half_specified_pair_is_an_error() {
        let cfg = BilinearNetworkLayerConfig::new(1).with_embed_size(Some(4));
        assert!(cfg.resolved_inputs_size().is_err());

        let cfg = BilinearNetworkLayerConfig::new(1)
            .with_num_fields(Some(3))
            .with_inputs_size(Some(12));
        assert!(cfg.resolved_inputs_size().is_err());
    }

    #[test]
    fn test_output_shape_is_flattened_inputs() {
        let device = Default::default();
        let layer  = BilinearNetworkLayerConfig::new(3)
            .with_embed_size(Some(4))
            .with_num_fields(Some(3))
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(layer.num_layers(), 3);

        let emb = Tensor::<TestBackend, 3>::random([2, 3, 4], Distribution::Default, &device);
        assert_eq!(layer.forward(emb).dims(), [2, 1, 12]);
    }

    #[test]
    fn test_zero_layers_returns_flattened_input() {
        let device = Default::default();
        let layer  = BilinearNetworkLayerConfig::new(0)
            .with_inputs_size(Some(4))
            .init::<TestBackend>(&device)
            .unwrap();

        let emb = Tensor::<TestBackend, 3>::from_floats([[[1.0, 2.0], [3.0, 4.0]]], &device);
        let out: Vec<f32> = layer.forward(emb).into_data().to_vec().unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_bilinear_matches_hand_computation() {
        let device   = Default::default();
        let bilinear = Bilinear::<TestBackend>::new(2, 3, 2, &device);

        let x1 = [0.5f32, -1.0];
        let x2 = [1.0f32, 2.0, -0.5];
        let w: Vec<f32> = bilinear.weight.val().into_data().to_vec().unwrap();
        let b: Vec<f32> = bilinear.bias.val().into_data().to_vec().unwrap();

        let mut expected = vec![0.0f32; 2];
        for o in 0..2 {
            expected[o] = b[o];
            for i in 0..2 {
                for j in 0..3 {
                    expected[o] += x1[i] * w[o * 6 + i * 3 + j] * x2[j];
                }
            }
        }

        let out: Vec<f32> = bilinear
            .forward(
                Tensor::<TestBackend, 1>::from_floats(x1, &device).unsqueeze(),
                Tensor::<TestBackend, 1>::from_floats(x2, &device).unsqueeze(),
            )
            .into_data()
            .to_vec()
            .unwrap();

        for (o, e) in out.iter().zip(&expected) {
            assert!((o - e).abs() < 1e-5, "got {o}, expected {e}");
        }
    }

    #[test]
    fn test_residual_is_added_every_layer() {
        // With every weight and bias zeroed, each layer returns x_0 exactly
        let device = Default::default();
        let mut layer = BilinearNetworkLayerConfig::new(2)
            .with_inputs_size(Some(3))
            .init::<TestBackend>(&device)
            .unwrap();
        for bilinear in layer.layers.iter_mut() {
            bilinear.weight = Param::from_tensor(Tensor::zeros([3, 3, 3], &device));
            bilinear.bias   = Param::from_tensor(Tensor::zeros([3], &device));
        }

        let emb = Tensor::<TestBackend, 3>::from_floats([[[1.0, -2.0, 0.5]]], &device);
        let out: Vec<f32> = layer.forward(emb).into_data().to_vec().unwrap();
        assert_eq!(out, vec![1.0, -2.0, 0.5]);
    }
}
