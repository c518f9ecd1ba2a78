// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::ml::{loss::LossKind, regularizer::Regularizer};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train an AFM click-through-rate model on a synthetic click log
    Train(TrainArgs),

    /// Score one impression with a trained checkpoint
    Predict(PredictArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LossArg {
    /// Mean squared error on the raw score
    Mse,
    /// Binary cross-entropy on logits; predictions are probabilities
    Bce,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegArg {
    None,
    L1,
    L2,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of synthetic impressions to generate
    #[arg(long = "samples", default_value_t = 2_000)]
    pub num_samples: usize,

    #[arg(long, default_value_t = 50)]
    pub num_users: usize,

    #[arg(long, default_value_t = 100)]
    pub num_movies: usize,

    #[arg(long, default_value_t = 8)]
    pub num_genres: usize,

    /// Longest watch history per impression
    #[arg(long, default_value_t = 5)]
    pub max_history: usize,

    /// Seeds data generation, the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of impressions used for training, the rest validate
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Width E of every field embedding
    #[arg(long, default_value_t = 8)]
    pub embed_size: usize,

    /// Hidden width of the pairwise attention network
    #[arg(long, default_value_t = 8)]
    pub attn_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = LossArg::Mse)]
    pub loss: LossArg,

    #[arg(long, value_enum, default_value_t = RegArg::L2)]
    pub reg: RegArg,

    #[arg(long, default_value_t = 0.1)]
    pub reg_lambda: f64,

    /// 0 = silent, 1 = console logs, 2 = console + metrics.csv
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: u8,

    /// Log the running step average every N steps
    #[arg(long, default_value_t = 500)]
    pub log_step: usize,

    #[arg(long, default_value = "logdir")]
    pub log_dir: String,

    /// Directory to save checkpoints and configs
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

impl From<LossArg> for LossKind {
    fn from(a: LossArg) -> Self {
        match a {
            LossArg::Mse => LossKind::Mse,
            LossArg::Bce => LossKind::BinaryCrossEntropy,
        }
    }
}

fn regularizer(reg: RegArg, lambda: f64) -> Regularizer {
    match reg {
        RegArg::None => Regularizer::None,
        RegArg::L1   => Regularizer::L1(lambda),
        RegArg::L2   => Regularizer::L2(lambda),
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            checkpoint_dir: a.checkpoint_dir,
            num_samples:    a.num_samples,
            num_users:      a.num_users,
            num_movies:     a.num_movies,
            num_genres:     a.num_genres,
            max_history:    a.max_history,
            seed:           a.seed,
            train_fraction: a.train_fraction,
            embed_size:     a.embed_size,
            attn_size:      a.attn_size,
            dropout:        a.dropout,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            loss:           a.loss.into(),
            regularizer:    regularizer(a.reg, a.reg_lambda),
            verbosity:      a.verbosity,
            log_step:       a.log_step,
            log_dir:        a.log_dir,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// One feature column as `name=id[,id..]`, repeat per field
    #[arg(long = "feature", required = true, value_parser = parse_feature)]
    pub features: Vec<(String, Vec<i64>)>,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

/// `history=4,7,9` → ("history", [4, 7, 9])
pub fn parse_feature(s: &str) -> Result<(String, Vec<i64>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=id[,id..], got '{s}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{s}'"));
    }

    let ids = values
        .split(',')
        .map(|v| v.trim().parse::<i64>().map_err(|e| format!("bad id '{v}' in '{s}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((name.to_string(), ids))
}
