// ============================================================
// Layer 5: Interaction Layers
// ============================================================
//   afm.rs       attentional pairwise interaction  [B, N, E] → [B, 1, E]
//   bilinear.rs  residual bilinear stack           [B, N, E] → [B, 1, N·E]

pub mod afm;
pub mod bilinear;

pub use afm::{
    AfmLayerOutput, AttentionalFactorizationMachineLayer,
    AttentionalFactorizationMachineLayerConfig, PairIndex,
};
pub use bilinear::{Bilinear, BilinearNetworkLayer, BilinearNetworkLayerConfig};
