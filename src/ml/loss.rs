// ============================================================
// Layer 5: Training Objectives
// ============================================================
//   Mse                  mean squared error on raw scores
//   BinaryCrossEntropy   BCE on logits; scores become
//                        probabilities through a sigmoid

use burn::{
    nn::loss::{BinaryCrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
    tensor::activation::sigmoid,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossKind {
    #[default]
    Mse,
    BinaryCrossEntropy,
}

impl LossKind {
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::Mse                => "MSELoss",
            LossKind::BinaryCrossEntropy => "BCEWithLogitsLoss",
        }
    }

    /// scores: [B, 1], labels: [B, 1] (0.0 / 1.0) → mean loss [1]
    pub fn forward<B: Backend>(&self, scores: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            LossKind::Mse => MseLoss::new().forward(scores, labels, Reduction::Mean),
            LossKind::BinaryCrossEntropy => {
                let [batch_size, _] = scores.dims();
                BinaryCrossEntropyLossConfig::new()
                    .with_logits(true)
                    .init(&scores.device())
                    .forward(scores.reshape([batch_size]), labels.reshape([batch_size]).int())
            }
        }
    }

    /// Map raw scores to what a caller should see.
    pub fn activate<B: Backend>(&self, scores: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            LossKind::Mse                => scores,
            LossKind::BinaryCrossEntropy => sigmoid(scores),
        }
    }
}
