// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`   generates a click log and trains the network
//   2. `predict` loads a checkpoint and scores one impression

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ctr-afm",
    version,
    about = "Train an attentional factorization machine for click-through-rate prediction."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on {} synthetic impressions", args.num_samples);

    let history = TrainUseCase::new(args.into()).execute()?;

    match history.last() {
        Some(last) => println!("Training complete. Final train loss {:.4}. Checkpoint saved.", last.train_loss),
        None       => println!("Training complete (no epochs run)."),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;
    use crate::domain::traits::ClickPredictor;

    let use_case = PredictUseCase::new(&args.checkpoint_dir)?;
    let sample   = use_case.sample_from_features(args.features)?;
    let score    = use_case.predict(&sample)?;

    println!("\nPredicted score: {score:.4}");
    Ok(())
}
