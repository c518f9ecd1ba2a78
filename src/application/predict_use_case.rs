// ============================================================
// Layer 2: PredictUseCase
// ============================================================
// Restores a trained network from a checkpoint directory and
// scores single impressions given as `name → ids` columns.

use anyhow::{bail, Result};

use crate::domain::{
    field::{FieldKind, FieldSpec},
    sample::CtrSample,
    traits::ClickPredictor,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    inferencer: Inferencer,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let ckpt       = CheckpointManager::new(checkpoint_dir)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        Ok(Self { inferencer })
    }

    /// Build a sample from parsed `--feature` pairs and check every
    /// field the network was trained on is present and in range.
    pub fn sample_from_features(&self, features: Vec<(String, Vec<i64>)>) -> Result<CtrSample> {
        let sample = features
            .into_iter()
            .fold(CtrSample::new(0.0), |s, (name, ids)| s.with_field(name, ids));

        let missing: Vec<&str> = self
            .inferencer
            .fields()
            .iter()
            .filter(|f| sample.field(&f.name).is_none())
            .map(|f| f.name.as_str())
            .collect();
        if !missing.is_empty() {
            bail!("Missing feature(s): {}", missing.join(", "));
        }

        for field in self.inferencer.fields() {
            if let Some(ids) = sample.field(&field.name) {
                check_ids(field, ids)?;
            }
            if let FieldKind::Sequence { max_len, length_field } = &field.kind {
                if let Some(len) = sample.field(length_field) {
                    match len {
                        [n] if (0..=*max_len as i64).contains(n) => {}
                        _ => bail!("Feature '{length_field}' must be one length in 0..={max_len}, got {len:?}"),
                    }
                }
            }
        }
        Ok(sample)
    }
}

/// Ids must index the field's embedding table; categorical fields
/// take exactly one id and sequences at most `max_len`.
fn check_ids(field: &FieldSpec, ids: &[i64]) -> Result<()> {
    match &field.kind {
        FieldKind::Categorical if ids.len() != 1 => {
            bail!("Feature '{}' is categorical and takes exactly one id, got {}", field.name, ids.len())
        }
        FieldKind::Sequence { max_len, .. } if ids.len() > *max_len => {
            bail!("Feature '{}' takes at most {} ids, got {}", field.name, max_len, ids.len())
        }
        _ => {}
    }

    let limit = field.cardinality as i64;
    if let Some(bad) = ids.iter().find(|&&id| !(0..limit).contains(&id)) {
        bail!("Feature '{}' id {} is out of range 0..{}", field.name, bad, limit);
    }
    Ok(())
}

impl ClickPredictor for PredictUseCase {
    fn predict(&self, sample: &CtrSample) -> Result<f32> {
        self.inferencer.predict(sample)
    }
}
