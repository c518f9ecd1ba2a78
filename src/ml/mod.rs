// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All burn-specific code lives in this layer.
//
//   inputs/       embedding leaves and the schema-driven
//                 stacker that turns named id columns into
//                 one [B, N, E] field tensor
//   layers/       attentional FM pooling and the bilinear
//                 residual network
//   model.rs      AFM model: bias + first order + AFM term
//   network.rs    stackers wired to the model, CtrNetwork trait
//   loss.rs       MSE / BCE-with-logits objectives
//   regularizer.rs  L1 / L2 penalty over every parameter
//   trainer.rs    AdamW epoch loop, validation, checkpoints
//   inferencer.rs scores samples from a saved checkpoint
//   backend.rs    NdArray by default, Wgpu behind a feature
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Xiao et al. (2017) Attentional Factorization Machines

pub mod backend;

/// Embedding inputs and the heterogeneous input stacker
pub mod inputs;

/// Interaction layers
pub mod layers;

/// Attentional factorization machine model
pub mod model;

/// Field-level networks and the CtrNetwork trait
pub mod network;

pub mod loss;

pub mod regularizer;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference engine: loads a checkpoint and scores samples
pub mod inferencer;
