// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands, `train` and `eval`, and their flags.
// Defaults reproduce the reference CIFAR-10 run.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{eval_use_case::EvalConfig, train_use_case::TrainConfig};
use crate::domain::checkpoint_policy::CheckpointSlot;
use crate::ml::{device::DevicePreference, model::ModelKind};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a CNN on CIFAR-10, checkpointing latest and best
    Train(TrainArgs),

    /// Measure test accuracy of a saved checkpoint
    Eval(EvalArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Folder for checkpoints, metrics and the training log
    #[arg(long, default_value = "./output/test_densenet")]
    pub outf: PathBuf,

    /// Directory holding the CIFAR-10 binary batches
    #[arg(long, default_value = "./Data/cifar-10-batches-bin")]
    pub data_dir: PathBuf,

    /// Number of full passes over the training split
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Samples per gradient step
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Adam learning rate (constant for the whole run)
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    /// Data loader worker threads for the training split (0 = none)
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Seed for the per-epoch shuffle of the training split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Print a status line every N batches
    #[arg(long, default_value_t = 100)]
    pub log_interval: usize,

    /// Network architecture: densenet or lenet
    #[arg(long, default_value = "densenet")]
    pub model: ModelKind,

    /// Compute device: auto, gpu or cpu
    #[arg(long, default_value = "auto")]
    pub device: DevicePreference,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            outf:         a.outf,
            data_dir:     a.data_dir,
            epochs:       a.epochs,
            batch_size:   a.batch_size,
            lr:           a.lr,
            num_workers:  a.num_workers,
            seed:         a.seed,
            log_interval: a.log_interval,
            model:        a.model,
            device:       a.device,
        }
    }
}

/// All arguments for the `eval` command
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Output folder of a previous `train` run
    #[arg(long, default_value = "./output/test_densenet")]
    pub outf: PathBuf,

    /// Dataset directory (defaults to the one used for training)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Which checkpoint to evaluate
    #[arg(long, value_enum, default_value = "best")]
    pub slot: SlotArg,

    /// Samples per evaluation batch
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Compute device: auto, gpu or cpu
    #[arg(long, default_value = "auto")]
    pub device: DevicePreference,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum SlotArg {
    Best,
    Latest,
}

impl From<SlotArg> for CheckpointSlot {
    fn from(s: SlotArg) -> Self {
        match s {
            SlotArg::Best   => CheckpointSlot::Best,
            SlotArg::Latest => CheckpointSlot::Latest,
        }
    }
}

impl From<EvalArgs> for EvalConfig {
    fn from(a: EvalArgs) -> Self {
        EvalConfig {
            outf:       a.outf,
            data_dir:   a.data_dir,
            slot:       a.slot.into(),
            batch_size: a.batch_size,
            device:     a.device,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["cifar-trainer", "train"]).unwrap();
        let Commands::Train(args) = cli.into_command() else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.outf, PathBuf::from("./output/test_densenet"));
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.model, ModelKind::DenseNet);
        assert_eq!(cfg.device, DevicePreference::Auto);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "cifar-trainer", "train", "--outf", "/tmp/run", "--model", "lenet",
            "--device", "cpu", "--epochs", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.into_command() else { panic!("expected train") };
        assert_eq!(args.outf, PathBuf::from("/tmp/run"));
        assert_eq!(args.model, ModelKind::LeNet);
        assert_eq!(args.device, DevicePreference::Cpu);
        assert_eq!(args.epochs, 3);
    }

    #[test]
    fn test_bare_invocation_trains() {
        let cli = Cli::try_parse_from(["cifar-trainer", "--outf", "/tmp/bare"]).unwrap();
        let command = cli.into_command();
        assert_eq!(command.output_dir(), std::path::Path::new("/tmp/bare"));
        assert_eq!(command.log_file_name(), "train_log.txt");
        let Commands::Train(args) = command else { panic!("expected train") };
        assert_eq!(args.epochs, 100);
    }

    #[test]
    fn test_top_level_flags_and_subcommand_do_not_mix() {
        assert!(Cli::try_parse_from(["cifar-trainer", "--outf", "/tmp/x", "train"]).is_err());
    }

    #[test]
    fn test_bad_model_is_rejected() {
        assert!(Cli::try_parse_from(["cifar-trainer", "train", "--model", "vgg"]).is_err());
    }

    #[test]
    fn test_eval_slot() {
        let cli = Cli::try_parse_from(["cifar-trainer", "eval", "--slot", "latest"]).unwrap();
        let Commands::Eval(args) = cli.into_command() else { panic!("expected eval") };
        let cfg: EvalConfig = args.into();
        assert_eq!(cfg.slot, CheckpointSlot::Latest);
        assert!(cfg.data_dir.is_none());
    }
}
