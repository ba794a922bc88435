// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Re-measures a saved checkpoint on the test split:
//
//   Step 1: Read train_config.json from the output directory
//   Step 2: Load the test split
//   Step 3: Pick the compute device, once
//   Step 4: Rebuild the architecture and restore the slot
//   Step 5: One evaluation pass → accuracy
//
// Runs on the plain (non-autodiff) backend, so no gradient
// graph is ever built.

use anyhow::Result;
use burn::{
    backend::{NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    prelude::*,
};
use std::path::PathBuf;

use crate::data::{batcher::ImageBatcher, cifar::Cifar10Source, dataset::ImageDataset};
use crate::domain::{checkpoint_policy::CheckpointSlot, traits::SampleSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    densenet::DenseNetConfig,
    device::{ComputeDevice, DevicePreference},
    evaluator::{accuracy_of, evaluate},
    lenet::LeNetConfig,
    model::{ImageClassifier, ModelKind},
};

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Output directory of a previous training run
    pub outf:       PathBuf,
    /// Overrides the dataset directory recorded at training time
    pub data_dir:   Option<PathBuf>,
    pub slot:       CheckpointSlot,
    pub batch_size: usize,
    pub device:     DevicePreference,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            outf:       PathBuf::from("./output/test_densenet"),
            data_dir:   None,
            slot:       CheckpointSlot::Best,
            batch_size: 128,
            device:     DevicePreference::Auto,
        }
    }
}

pub struct EvalUseCase {
    config:       EvalConfig,
    ckpt_manager: CheckpointManager,
    model_kind:   ModelKind,
    source:       Box<dyn SampleSource>,
}

impl EvalUseCase {
    /// Read the saved run config and point at its dataset
    pub fn new(config: EvalConfig) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(&config.outf)?;
        let train_cfg    = ckpt_manager.load_config()?;
        let data_dir     = config.data_dir.clone().unwrap_or(train_cfg.data_dir);
        let source       = Box::new(Cifar10Source::new(data_dir));
        Ok(Self { config, ckpt_manager, model_kind: train_cfg.model, source })
    }

    /// Same as `new` but with the test split coming from `source`
    pub fn with_source(config: EvalConfig, source: Box<dyn SampleSource>) -> Result<Self> {
        let ckpt_manager = CheckpointManager::new(&config.outf)?;
        let train_cfg    = ckpt_manager.load_config()?;
        Ok(Self { config, ckpt_manager, model_kind: train_cfg.model, source })
    }

    /// Test accuracy of the configured slot, as a ratio in [0, 1]
    pub fn execute(&self) -> Result<f64> {
        anyhow::ensure!(self.config.batch_size > 0, "batch size must be positive");

        let test_dataset = ImageDataset::new(self.source.test_split()?);
        tracing::info!("Loaded {} test images", test_dataset.sample_count());

        let device = ComputeDevice::select(self.config.device);
        tracing::info!("Using device: {}", device);

        let accuracy = match device {
            ComputeDevice::Accelerator(d) => self.on_backend::<Wgpu>(test_dataset, d)?,
            ComputeDevice::Cpu(d)         => self.on_backend::<NdArray>(test_dataset, d)?,
        };

        tracing::info!(
            "Test Acc of {} checkpoint ({}) is: {:.2}%",
            self.config.slot,
            self.model_kind,
            accuracy * 100.0,
        );
        Ok(accuracy)
    }

    fn on_backend<B: Backend>(&self, test_dataset: ImageDataset, device: B::Device) -> Result<f64> {
        match self.model_kind {
            ModelKind::DenseNet => {
                let model = DenseNetConfig::new().init::<B>(&device);
                self.measure::<B, _>(model, test_dataset, device)
            }
            ModelKind::LeNet => {
                let model = LeNetConfig::new().init::<B>(&device);
                self.measure::<B, _>(model, test_dataset, device)
            }
        }
    }

    fn measure<B, M>(&self, model: M, test_dataset: ImageDataset, device: B::Device) -> Result<f64>
    where
        B: Backend,
        M: ImageClassifier<B>,
    {
        let model = self.ckpt_manager.load_model(model, self.config.slot, &device)?;

        let loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device))
            .batch_size(self.config.batch_size)
            .build(test_dataset);

        accuracy_of(&evaluate(&model, loader.iter()))
    }
}
