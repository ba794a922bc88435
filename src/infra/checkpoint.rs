// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model parameters with Burn's named
// MessagePack + gzip file recorder (full precision).
//
// Output directory layout:
//   <outf>/
//     net_latest.mpk.gz   ← parameters after the most recent epoch
//     net_best.mpk.gz     ← parameters of the best test accuracy so far
//     train_config.json   ← run configuration, used to rebuild the model
//
// Every save replaces its slot's previous contents.
//
// Why only two slots?
//   A run of 100 epochs would otherwise leave 100 snapshots
//   behind. "latest" lets a run be inspected where it stopped;
//   "best" keeps the parameters behind the highest test
//   accuracy seen so far, which is the model worth shipping.
//
// Why save the config separately?
//   A snapshot only holds parameter values. To load it, `eval`
//   first has to rebuild the same architecture (DenseNet or
//   LeNet) and then pour the values into it. train_config.json
//   records which one was trained.
//
// Why full precision instead of CompactRecorder?
//   CompactRecorder stores half-precision floats. Restoring
//   such a snapshot gives slightly different logits, so `eval`
//   would not reproduce the accuracy printed during training.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::domain::checkpoint_policy::CheckpointSlot;

type SlotRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Extension the recorder appends to a slot's file stem
const SLOT_EXTENSION: &str = "mpk.gz";

const CONFIG_FILE: &str = "train_config.json";

/// Manages the two checkpoint slots and the saved run config.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a CheckpointManager, creating the directory if it
    /// doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Slot path without extension; the recorder appends its own
    fn slot_stem(&self, slot: CheckpointSlot) -> PathBuf {
        self.dir.join(slot.file_stem())
    }

    /// Full path of the file a slot is written to
    pub fn slot_path(&self, slot: CheckpointSlot) -> PathBuf {
        self.slot_stem(slot).with_extension(SLOT_EXTENSION)
    }

    pub fn has_slot(&self, slot: CheckpointSlot) -> bool {
        self.slot_path(slot).exists()
    }

    /// Overwrite `slot` with the current parameters of `model`.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, slot: CheckpointSlot) -> Result<()> {
        let path = self.slot_stem(slot);

        model
            .clone()
            .save_file(path.clone(), &SlotRecorder::new())
            .with_context(|| format!("Failed to save {slot} checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved {} checkpoint to '{}'", slot, self.slot_path(slot).display());
        Ok(())
    }

    /// Restore the parameters stored in `slot` into `model`.
    ///
    /// `model` must have the same architecture as the one that
    /// was saved, or loading fails.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        slot:   CheckpointSlot,
        device: &B::Device,
    ) -> Result<M> {
        if !self.has_slot(slot) {
            anyhow::bail!(
                "No {slot} checkpoint at '{}'. Have you trained the model first?",
                self.slot_path(slot).display()
            );
        }

        let path = self.slot_stem(slot);
        tracing::info!("Loading {} checkpoint from '{}'", slot, self.slot_path(slot).display());

        model
            .load_file(path.clone(), &SlotRecorder::new(), device)
            .with_context(|| {
                format!(
                    "Cannot load {slot} checkpoint '{}'. Was it saved from a different model?",
                    path.display()
                )
            })
    }

    /// Save the run configuration so `eval` can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'eval'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::lenet::{LeNet, LeNetConfig};

    type TestBackend = NdArray;

    fn weights(model: &LeNet<TestBackend>) -> Vec<f32> {
        model.fc3.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_directory_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/output");
        let mgr = CheckpointManager::new(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(mgr.slot_path(CheckpointSlot::Best), dir.join("net_best.mpk.gz"));
    }

    #[test]
    fn test_slot_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        assert_eq!(mgr.slot_path(CheckpointSlot::Latest), tmp.path().join("net_latest.mpk.gz"));
        assert_eq!(mgr.slot_path(CheckpointSlot::Best), tmp.path().join("net_best.mpk.gz"));
    }

    #[test]
    fn test_save_then_restore_into_fresh_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let saved: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        mgr.save_model(&saved, CheckpointSlot::Best).unwrap();
        assert!(mgr.has_slot(CheckpointSlot::Best));
        assert!(!mgr.has_slot(CheckpointSlot::Latest));

        let fresh: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        assert_ne!(weights(&saved), weights(&fresh));

        let restored = mgr.load_model(fresh, CheckpointSlot::Best, &device).unwrap();
        assert_eq!(weights(&saved), weights(&restored));
    }

    #[test]
    fn test_saving_overwrites_the_slot() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();

        let first:  LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let second: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        mgr.save_model(&first, CheckpointSlot::Latest).unwrap();
        mgr.save_model(&second, CheckpointSlot::Latest).unwrap();

        let template: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let restored = mgr.load_model(template, CheckpointSlot::Latest, &device).unwrap();
        assert_eq!(weights(&second), weights(&restored));
    }

    #[test]
    fn test_missing_slot_is_an_error() {
        let tmp    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(tmp.path()).unwrap();
        let device = Default::default();
        let model: LeNet<TestBackend> = LeNetConfig::new().init(&device);
        let err = mgr.load_model(model, CheckpointSlot::Best, &device).unwrap_err();
        assert!(err.to_string().contains("No best checkpoint"));
    }

    #[test]
    fn test_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        let cfg = TrainConfig { epochs: 3, batch_size: 16, ..TrainConfig::default() };
        mgr.save_config(&cfg).unwrap();
        let loaded = mgr.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.batch_size, 16);
        assert_eq!(loaded.model, cfg.model);
    }
}
