// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Generate the click log        (Layer 4 - data)
//   Step 2: Split train/validation        (Layer 4 - data)
//   Step 3: Build datasets                (Layer 4 - data)
//   Step 4: Save config                   (Layer 6 - infra)
//   Step 5: Run training loop             (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::CtrDataset,
    splitter::split_train_val,
    synthetic::SyntheticClickLog,
};
use crate::domain::traits::SampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::loss::LossKind;
use crate::ml::regularizer::Regularizer;
use crate::ml::trainer::{run_training, EpochSummary, TrainerConfig};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Saved next to the checkpoints
// so `predict` knows how scores were trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub checkpoint_dir: String,

    // synthetic click log
    pub num_samples:    usize,
    pub num_users:      usize,
    pub num_movies:     usize,
    pub num_genres:     usize,
    pub max_history:    usize,
    pub seed:           u64,
    pub train_fraction: f64,

    // network
    pub embed_size:     usize,
    pub attn_size:      usize,
    pub dropout:        f64,

    // optimisation
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub loss:           LossKind,
    pub regularizer:    Regularizer,

    // logging
    pub verbosity:      u8,
    pub log_step:       usize,
    pub log_dir:        String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let data    = SyntheticClickLog::default();
        let trainer = TrainerConfig::default();
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            num_samples:    data.num_samples,
            num_users:      data.num_users,
            num_movies:     data.num_movies,
            num_genres:     data.num_genres,
            max_history:    data.max_history,
            seed:           data.seed,
            train_fraction: 0.8,
            embed_size:     8,
            attn_size:      8,
            dropout:        0.1,
            batch_size:     64,
            epochs:         trainer.epochs,
            lr:             trainer.lr,
            loss:           trainer.loss,
            regularizer:    trainer.regularizer,
            verbosity:      1,
            log_step:       trainer.log_step,
            log_dir:        "logdir".to_string(),
        }
    }
}

impl TrainConfig {
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            epochs:      self.epochs,
            lr:          self.lr,
            loss:        self.loss,
            regularizer: self.regularizer,
            verbosity:   self.verbosity,
            log_step:    self.log_step,
            log_dir:     PathBuf::from(&self.log_dir),
        }
    }

    pub fn click_log(&self) -> SyntheticClickLog {
        SyntheticClickLog {
            num_samples: self.num_samples,
            num_users:   self.num_users,
            num_movies:  self.num_movies,
            num_genres:  self.num_genres,
            max_history: self.max_history,
            seed:        self.seed,
            ..SyntheticClickLog::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.train_fraction) {
            bail!("train_fraction must lie in [0, 1], got {}", self.train_fraction);
        }
        // Ids travel as i32 in the batcher
        let largest = self.num_users.max(self.num_movies).max(self.num_genres);
        if largest > i32::MAX as usize {
            bail!("id counts must not exceed {}, got {}", i32::MAX, largest);
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<Vec<EpochSummary>> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Generate impressions ──────────────────────────────────────
        let source  = cfg.click_log();
        let fields  = source.field_specs();
        let samples = source.load_all()?;
        if samples.is_empty() {
            bail!("No samples to train on");
        }

        // ── Step 2: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train_samples.len(), val_samples.len());

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = CtrDataset::new(train_samples);
        let val_dataset   = CtrDataset::new(val_samples);
        tracing::info!("Training click rate: {:.3}", train_dataset.click_rate());

        // ── Step 4: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, &fields, train_dataset, val_dataset, ckpt_manager)
    }
}
