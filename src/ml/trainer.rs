// ============================================================
// Layer 5: Trainer
// ============================================================
// Epoch loop over Burn's DataLoader with AdamW, an optional
// parameter regularizer, and verbosity-gated logging.
//
//   verbosity 0   silent
//   verbosity 1   tracing console logs (epoch / step averages)
//   verbosity 2   console + metrics.csv under log_dir
//
// Backend split:
//   - Training uses TrainBackend (Autodiff<Inner>) for gradients
//   - model.valid() returns the model on InnerBackend, with
//     dropout disabled, for the validation pass
//   - Validation batcher must also use InnerBackend
//
// Burn produces a fresh gradient set on every backward(), so
// there is no explicit zero-grad step.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::{CtrBatch, CtrBatcher}, dataset::CtrDataset};
use crate::domain::field::FieldSpec;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::backend::{default_device, InnerBackend, TrainBackend};
use crate::ml::inputs::FeatureBatch;
use crate::ml::loss::LossKind;
use crate::ml::network::{AfmNetwork, AfmNetworkConfig, CtrNetwork};
use crate::ml::regularizer::Regularizer;

pub const STEPS_AVG_LOSS_TAG:      &str = "training/steps_avg_loss";
pub const EPOCH_AVG_LOSS_TAG:      &str = "training/epoch_avg_loss";
pub const VALID_EPOCH_AVG_LOSS_TAG: &str = "validation/epoch_avg_loss";

// ─── TrainerConfig ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub epochs:      usize,
    pub lr:          f64,
    pub loss:        LossKind,
    pub regularizer: Regularizer,
    pub verbosity:   u8,
    /// Log the running step average every `log_step` steps
    pub log_step:    usize,
    pub log_dir:     PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs:      10,
            lr:          1e-3,
            loss:        LossKind::Mse,
            regularizer: Regularizer::L2(0.1),
            verbosity:   0,
            log_step:    500,
            log_dir:     PathBuf::from("logdir"),
        }
    }
}

/// Losses recorded at the end of one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch:      usize,
    pub train_loss: f64,
    pub valid_loss: Option<f64>,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer {
    cfg:         TrainerConfig,
    metrics:     Option<MetricsLogger>,
    checkpoints: Option<CheckpointManager>,
    global_step: usize,
    history:     Vec<EpochSummary>,
}

impl Trainer {
    pub fn new(cfg: TrainerConfig) -> Result<Self> {
        if cfg.log_step == 0 {
            bail!("log_step must be at least 1");
        }
        if cfg.verbosity >= 1 {
            tracing::info!("Trainer logger initialised (verbosity={})", cfg.verbosity);
        }

        let metrics = if cfg.verbosity >= 2 {
            let logger = MetricsLogger::new(&cfg.log_dir)?;
            tracing::info!("Metrics are written to '{}'", logger.csv_path().display());
            Some(logger)
        } else {
            None
        };

        Ok(Self { cfg, metrics, checkpoints: None, global_step: 0, history: Vec::new() })
    }

    /// Save weights after every epoch of `fit`.
    pub fn with_checkpoints(mut self, checkpoints: CheckpointManager) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.cfg
    }

    pub fn global_step(&self) -> usize {
        self.global_step
    }

    pub fn history(&self) -> &[EpochSummary] {
        &self.history
    }

    // ─── Summary ──────────────────────────────────────────────────────────────

    /// Bordered two-column table of the training setup.
    pub fn describe<B: Backend, M: Module<B>>(&self, model: &M) -> String {
        let log_dir = match self.metrics {
            Some(_) => self.cfg.log_dir.display().to_string(),
            None    => "-".to_string(),
        };
        let rows = [
            ("network",       short_type_name::<M>().to_string()),
            ("loss",          self.cfg.loss.name().to_string()),
            ("optimizer",     "AdamW".to_string()),
            ("learning rate", format!("{}", self.cfg.lr)),
            ("reg norm",      self.cfg.regularizer.norm().to_string()),
            ("reg lambda",    self.cfg.regularizer.lambda()),
            ("num of epochs", self.cfg.epochs.to_string()),
            ("parameters",    model.num_params().to_string()),
            ("log directory", log_dir),
        ];

        let key_w = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let val_w = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let rule  = format!("+-{}-+-{}-+", "-".repeat(key_w), "-".repeat(val_w));

        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        for (key, value) in rows.iter() {
            out.push_str(&format!("| {key:<key_w$} | {value:<val_w$} |\n"));
        }
        out.push_str(&rule);
        out
    }

    // ─── Steps ────────────────────────────────────────────────────────────────

    /// Primary loss plus the regularizer penalty over `model`.
    fn objective<B: Backend, M: Module<B>>(
        &self,
        model:  &M,
        scores: Tensor<B, 2>,
        labels: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let loss = self.cfg.loss.forward(scores, labels);
        match self.cfg.regularizer.penalty(model) {
            Some(penalty) => loss + penalty,
            None          => loss,
        }
    }

    /// One optimisation step: forward, loss, backward, update.
    /// Returns the updated model and the step loss.
    pub fn iterate<B, M, O>(&self, model: M, optim: &mut O, batch: CtrBatch<B>) -> Result<(M, f64)>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + CtrNetwork<B>,
        O: Optimizer<M, B>,
    {
        let scores = model.forward_features(&batch.features)?;
        let loss   = self.objective(&model, scores, batch.labels);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let model = optim.step(self.cfg.lr, model, grads);

        Ok((model, loss_val))
    }

    /// Mean primary loss over `loader`, without the regularizer.
    pub fn evaluate<B: Backend, M: CtrNetwork<B>>(
        &self,
        model:  &M,
        loader: &dyn DataLoader<CtrBatch<B>>,
    ) -> Result<f64> {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            let scores = model.forward_features(&batch.features)?;
            loss_sum += self.cfg.loss.forward(scores, batch.labels).into_scalar().elem::<f64>();
            batches  += 1;
        }

        Ok(if batches > 0 { loss_sum / batches as f64 } else { f64::NAN })
    }

    // ─── Epoch loop ───────────────────────────────────────────────────────────

    pub fn fit<B, M>(
        &mut self,
        mut model:    M,
        train_loader: &dyn DataLoader<CtrBatch<B>>,
        valid_loader: Option<&dyn DataLoader<CtrBatch<B::InnerBackend>>>,
    ) -> Result<M>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + CtrNetwork<B>,
        M::InnerModule: CtrNetwork<B::InnerBackend>,
    {
        let mut optim = AdamWConfig::new().init();

        let mut steps_loss  = 0.0f64;
        let mut steps_count = 0usize;

        for epoch in 1..=self.cfg.epochs {
            if self.cfg.verbosity >= 1 {
                tracing::info!("Epoch {} / {}:", epoch, self.cfg.epochs);
            }

            let mut epoch_loss = 0.0f64;
            let mut batches    = 0usize;

            for batch in train_loader.iter() {
                let (next, loss_val) = self.iterate(model, &mut optim, batch)?;
                model = next;

                steps_loss  += loss_val;
                steps_count += 1;
                epoch_loss  += loss_val;
                batches     += 1;
                self.global_step += 1;

                if self.global_step % self.cfg.log_step == 0 {
                    let avg = steps_loss / steps_count as f64;
                    if self.cfg.verbosity >= 1 {
                        tracing::info!("step {} avg loss : {:.4}", self.global_step, avg);
                    }
                    self.log_scalar(STEPS_AVG_LOSS_TAG, avg, self.global_step)?;
                    steps_loss  = 0.0;
                    steps_count = 0;
                }
            }

            let train_loss = if batches > 0 { epoch_loss / batches as f64 } else { f64::NAN };
            if self.cfg.verbosity >= 1 {
                tracing::info!("epoch avg loss : {:.4}", train_loss);
            }
            self.log_scalar(EPOCH_AVG_LOSS_TAG, train_loss, epoch)?;

            let valid_loss = match valid_loader {
                Some(loader) => {
                    let loss = self.evaluate(&model.valid(), loader)?;
                    if self.cfg.verbosity >= 1 {
                        tracing::info!("validation avg loss : {:.4}", loss);
                    }
                    self.log_scalar(VALID_EPOCH_AVG_LOSS_TAG, loss, epoch)?;
                    Some(loss)
                }
                None => None,
            };

            if let Some(checkpoints) = &self.checkpoints {
                checkpoints.save_model(&model, epoch)?;
                tracing::debug!("Checkpoint saved for epoch {}", epoch);
            }

            self.history.push(EpochSummary { epoch, train_loss, valid_loss });
        }

        Ok(model)
    }

    fn log_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()> {
        if let Some(metrics) = &self.metrics {
            metrics.add_scalar(tag, value, step)?;
        }
        Ok(())
    }

    // ─── Inference and persistence ────────────────────────────────────────────

    /// Scores for a batch: probabilities under BCE, raw outputs under MSE.
    pub fn predict<B: Backend, M: CtrNetwork<B>>(
        &self,
        model:    &M,
        features: &FeatureBatch<B>,
    ) -> Result<Tensor<B, 2>> {
        let scores = model.forward_features(features)?;
        Ok(self.cfg.loss.activate(scores))
    }

    pub fn save<B: Backend, M: Module<B>>(&self, model: &M, epoch: usize) -> Result<()> {
        self.checkpoint_manager()?.save_model(model, epoch)
    }

    /// Restore the latest saved weights into `model`.
    pub fn load<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M> {
        self.checkpoint_manager()?.load_model(model, device)
    }

    fn checkpoint_manager(&self) -> Result<&CheckpointManager> {
        self.checkpoints
            .as_ref()
            .context("No checkpoint directory attached to this trainer")
    }
}

/// `ctr_afm::ml::network::AfmNetwork<..>` → `AfmNetwork`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ─── Entry point used by TrainUseCase ─────────────────────────────────────────

pub fn run_training(
    cfg:           &TrainConfig,
    fields:        &[FieldSpec],
    train_dataset: CtrDataset,
    val_dataset:   CtrDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<Vec<EpochSummary>> {
    let device = default_device();
    tracing::info!("Using device: {:?}", device);

    let network_cfg = AfmNetworkConfig::new(fields.to_vec(), cfg.embed_size, cfg.attn_size)
        .with_dropout(cfg.dropout);
    ckpt_manager.save_network_config(&network_cfg)?;

    let model: AfmNetwork<TrainBackend> = network_cfg.init(&device)?;
    tracing::info!("Model ready: {} fields, embed_size={}", model.num_fields(), cfg.embed_size);

    let has_validation = val_dataset.sample_count() > 0;

    let train_loader = DataLoaderBuilder::new(CtrBatcher::<TrainBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    let val_loader = DataLoaderBuilder::new(CtrBatcher::<InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut trainer = Trainer::new(cfg.trainer_config())?.with_checkpoints(ckpt_manager);
    println!("{}", trainer.describe(&model));

    let valid = if has_validation { Some(val_loader.as_ref()) } else { None };
    trainer.fit(model, train_loader.as_ref(), valid)?;

    for summary in trainer.history() {
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={}",
            summary.epoch,
            cfg.epochs,
            summary.train_loss,
            summary.valid_loss.map_or("-".to_string(), |l| format!("{l:.4}")),
        );
    }

    tracing::info!("Training complete!");
    Ok(trainer.history().to_vec())
}
