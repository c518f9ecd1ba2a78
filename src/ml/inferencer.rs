// ============================================================
// Layer 5: Inferencer
// ============================================================
// Rebuilds the trained AfmNetwork from a checkpoint directory
// and scores impressions on the inner (non-autodiff) backend.
use anyhow::{Context, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::CtrBatcher;
use crate::domain::{field::FieldSpec, sample::CtrSample};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::backend::{default_device, Device, InnerBackend};
use crate::ml::loss::LossKind;
use crate::ml::network::{AfmNetwork, CtrNetwork};

pub struct Inferencer {
    model:  AfmNetwork<InnerBackend>,
    fields: Vec<FieldSpec>,
    loss:   LossKind,
    device: Device,
}

impl Inferencer {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device      = default_device();
        let train_cfg   = ckpt_manager.load_config()?;
        let network_cfg = ckpt_manager.load_network_config()?.with_dropout(0.0);

        let model: AfmNetwork<InnerBackend> = network_cfg.init(&device)?;
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint ({} fields)", model.num_fields());

        Ok(Self { model, fields: network_cfg.fields, loss: train_cfg.loss, device })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fill in sequence length columns the caller left out.
    fn complete(&self, sample: &CtrSample) -> CtrSample {
        let mut sample = sample.clone();
        for field in &self.fields {
            if let Some(length_field) = field.length_field() {
                if sample.field(length_field).is_none() {
                    let len = sample.field(&field.name).map_or(0, <[i64]>::len);
                    sample.features.insert(length_field.to_string(), vec![len as i64]);
                }
            }
        }
        sample
    }

    /// One score per sample, in input order.
    pub fn predict_batch(&self, samples: &[CtrSample]) -> Result<Vec<f32>> {
        let items: Vec<CtrSample> = samples.iter().map(|s| self.complete(s)).collect();
        let batch  = CtrBatcher::<InnerBackend>::new(self.device.clone()).batch(items);
        let scores = self.model.forward_features(&batch.features)?;

        self.loss
            .activate(scores)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read scores: {e:?}"))
    }

    pub fn predict(&self, sample: &CtrSample) -> Result<f32> {
        let scores = self.predict_batch(std::slice::from_ref(sample))?;
        let score  = scores.first().copied().context("Model returned no score")?;
        tracing::debug!("score={:.4} for {:?}", score, sample.features);
        Ok(score)
    }
}
