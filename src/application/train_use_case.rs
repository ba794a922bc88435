// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Prepare output directory + save config  (Layer 6 - infra)
//   Step 2: Load train / test splits                (Layer 4 - data)
//   Step 3: Pick the compute device, once           (Layer 5 - ml)
//   Step 4: Build the model on that device          (Layer 5 - ml)
//   Step 5: Run the training loop                   (Layer 5 - ml)

use anyhow::Result;
use burn::{
    backend::{Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{cifar::Cifar10Source, dataset::ImageDataset};
use crate::domain::traits::SampleSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    densenet::DenseNetConfig,
    device::{ComputeDevice, DevicePreference},
    lenet::LeNetConfig,
    model::{ImageClassifier, ModelKind},
    trainer::{run_training, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Serialisable so it can be
// saved next to the checkpoints and reloaded by `eval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub outf:         PathBuf,
    pub data_dir:     PathBuf,
    pub epochs:       usize,
    pub batch_size:   usize,
    pub lr:           f64,
    pub num_workers:  usize,
    pub seed:         u64,
    pub log_interval: usize,
    pub model:        ModelKind,
    pub device:       DevicePreference,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            outf:         PathBuf::from("./output/test_densenet"),
            data_dir:     PathBuf::from("./Data/cifar-10-batches-bin"),
            epochs:       100,
            batch_size:   128,
            lr:           0.01,
            num_workers:  4,
            seed:         42,
            log_interval: 100,
            model:        ModelKind::DenseNet,
            device:       DevicePreference::Auto,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    source: Box<dyn SampleSource>,
}

impl TrainUseCase {
    /// Train on CIFAR-10 read from `config.data_dir`
    pub fn new(config: TrainConfig) -> Self {
        let source = Box::new(Cifar10Source::new(config.data_dir.clone()));
        Self { config, source }
    }

    /// Train on samples from any other source
    pub fn with_source(config: TrainConfig, source: Box<dyn SampleSource>) -> Self {
        Self { config, source }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        anyhow::ensure!(cfg.batch_size > 0, "batch size must be positive");

        // ── Step 1: Output directory and config ───────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.outf)?;
        ckpt_manager.save_config(cfg)?;
        let metrics_logger = MetricsLogger::create(&cfg.outf)?;

        // ── Step 2: Datasets ──────────────────────────────────────────────────
        let train_samples = self.source.train_split()?;
        let test_samples  = self.source.test_split()?;
        tracing::info!(
            "Loaded {} training and {} test images ({} classes: {})",
            train_samples.len(),
            test_samples.len(),
            self.source.class_names().len(),
            self.source.class_names().join(", "),
        );
        let train_dataset = ImageDataset::new(train_samples);
        let test_dataset  = ImageDataset::new(test_samples);

        // ── Step 3: Device, decided once ──────────────────────────────────────
        let device = ComputeDevice::select(cfg.device);
        tracing::info!("Using device: {}", device);
        if cfg.device == DevicePreference::Auto && !device.is_accelerator() {
            tracing::warn!("No accelerator found; training on the CPU will be slow");
        }

        // ── Steps 4 + 5: Model and training loop ──────────────────────────────
        let run = TrainRun { cfg, train_dataset, test_dataset, ckpt_manager, metrics_logger };
        match device {
            ComputeDevice::Accelerator(d) => run.on_backend::<Autodiff<Wgpu>>(d),
            ComputeDevice::Cpu(d)         => run.on_backend::<Autodiff<NdArray>>(d),
        }
    }
}

/// Everything the loop needs once the backend is known
struct TrainRun<'a> {
    cfg:            &'a TrainConfig,
    train_dataset:  ImageDataset,
    test_dataset:   ImageDataset,
    ckpt_manager:   CheckpointManager,
    metrics_logger: MetricsLogger,
}

impl TrainRun<'_> {
    fn on_backend<B: AutodiffBackend>(self, device: B::Device) -> Result<TrainingSummary> {
        match self.cfg.model {
            ModelKind::DenseNet => {
                let model = DenseNetConfig::new().init::<B>(&device);
                self.fit::<B, _>(model, device)
            }
            ModelKind::LeNet => {
                let model = LeNetConfig::new().init::<B>(&device);
                self.fit::<B, _>(model, device)
            }
        }
    }

    fn fit<B, M>(self, model: M, device: B::Device) -> Result<TrainingSummary>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ImageClassifier<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
    {
        tracing::info!("Model: {} ({} parameters)", self.cfg.model, model.num_params());

        run_training::<B, M>(
            self.cfg,
            model,
            self.train_dataset,
            self.test_dataset,
            &self.ckpt_manager,
            &self.metrics_logger,
            device,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        checkpoint_policy::CheckpointSlot,
        sample::{ImageSample, PIXELS_PER_IMAGE},
        traits::InMemorySource,
    };

    /// Bright images are class 1, dark images class 0
    fn synthetic_source() -> InMemorySource {
        let make = |n: usize| -> Vec<ImageSample> {
            (0..n)
                .map(|i| {
                    let label = i % 2;
                    let level = if label == 1 { 230 } else { 20 };
                    ImageSample::new(vec![level; PIXELS_PER_IMAGE], label)
                })
                .collect()
        };
        InMemorySource {
            train:   make(10),
            test:    make(6),
            classes: vec!["dark".into(), "bright".into()],
        }
    }

    fn tiny_config(outf: PathBuf) -> TrainConfig {
        TrainConfig {
            outf,
            epochs:       2,
            batch_size:   4,
            lr:           0.001,
            num_workers:  0,
            log_interval: 1,
            model:        ModelKind::LeNet,
            device:       DevicePreference::Cpu,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_follow_the_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.outf, PathBuf::from("./output/test_densenet"));
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.num_workers, 4);
    }

    #[test]
    fn test_two_epoch_run_writes_slots_and_metrics() {
        let tmp  = tempfile::tempdir().unwrap();
        let outf = tmp.path().join("run");
        let use_case = TrainUseCase::with_source(tiny_config(outf.clone()), Box::new(synthetic_source()));

        let summary = use_case.execute().unwrap();
        assert_eq!(summary.epochs.len(), 2);

        // best accuracy never decreases and matches the running max
        let mut running_max = 0.0f64;
        for row in &summary.epochs {
            running_max = running_max.max(row.test_acc);
            assert_eq!(row.best_acc, running_max);
            assert!((0.0..=1.0).contains(&row.test_acc));
        }
        assert_eq!(summary.best_accuracy, running_max);

        let mgr = CheckpointManager::new(&outf).unwrap();
        assert!(mgr.has_slot(CheckpointSlot::Latest));
        assert_eq!(mgr.has_slot(CheckpointSlot::Best), summary.best_epoch.is_some());
        assert!(outf.join("train_config.json").exists());

        let csv = std::fs::read_to_string(outf.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_run_with_loader_workers() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            num_workers: 3,
            batch_size:  3,
            ..tiny_config(tmp.path().to_path_buf())
        };
        let summary = TrainUseCase::with_source(cfg, Box::new(synthetic_source()))
            .execute()
            .unwrap();
        assert_eq!(summary.epochs.len(), 2);
        assert!(summary.epochs.iter().all(|row| row.train_loss.is_finite()));
    }

    #[test]
    fn test_empty_test_split_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = synthetic_source();
        source.test.clear();
        let use_case = TrainUseCase::with_source(tiny_config(tmp.path().to_path_buf()), Box::new(source));
        assert!(use_case.execute().is_err());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { batch_size: 0, ..tiny_config(tmp.path().to_path_buf()) };
        let use_case = TrainUseCase::with_source(cfg, Box::new(synthetic_source()));
        assert!(use_case.execute().is_err());
    }
}
