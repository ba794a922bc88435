// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to Layer 2.
//
//   1. `train` — trains a CNN and writes latest/best checkpoints
//   2. `eval`  — restores a checkpoint and reports test accuracy
//
// `train` is also the default: `cifar-trainer --outf DIR` with
// no subcommand parses the training flags at the top level.
// Mixing the two forms (`cifar-trainer --outf DIR train`) is
// rejected.
//
// Reference: Rust Book §12 (Building a CLI Program)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use commands::{Commands, EvalArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cifar-trainer",
    version,
    about = "Train a CNN backbone on CIFAR-10, keeping the latest and best checkpoints.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// The subcommand to run (train or eval); train when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Training flags used when no subcommand is given
    #[command(flatten)]
    pub train: TrainArgs,
}

impl Cli {
    /// The command to run, with a bare invocation meaning `train`
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Train(self.train))
    }
}

impl Commands {
    /// Output directory the command writes its log into
    pub fn output_dir(&self) -> &Path {
        match self {
            Commands::Train(args) => &args.outf,
            Commands::Eval(args)  => &args.outf,
        }
    }

    /// Log file name inside the output directory
    pub fn log_file_name(&self) -> &'static str {
        match self {
            Commands::Train(_) => "train_log.txt",
            Commands::Eval(_)  => "eval_log.txt",
        }
    }

    pub fn run(self) -> Result<()> {
        match self {
            Commands::Train(args) => run_train(args),
            Commands::Eval(args)  => run_eval(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on CIFAR-10 from '{}'", args.data_dir.display());

    let summary = TrainUseCase::new(args.into()).execute()?;
    if let Some(last) = summary.epochs.last() {
        tracing::info!(
            "Final epoch {}: train loss {:.3}, test acc {:.2}%",
            last.epoch,
            last.train_loss,
            last.test_acc * 100.0
        );
    }
    match summary.best_epoch {
        Some(epoch) => tracing::info!(
            "Best checkpoint: epoch {} ({:.2}%)",
            epoch,
            summary.best_accuracy * 100.0
        ),
        None => tracing::warn!("No epoch beat 0% accuracy; best checkpoint was never written"),
    }
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let use_case = EvalUseCase::new(args.into())?;
    let accuracy = use_case.execute()?;
    println!("Test accuracy: {:.2}%", accuracy * 100.0);
    Ok(())
}
