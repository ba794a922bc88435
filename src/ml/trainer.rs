// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Per epoch:
//   1. Train: iterate the shuffled, augmented training split
//      (TrainLoader, one ordered stream per epoch);
//      forward → cross-entropy → backward → Adam step, one
//      batch at a time. Every `log_interval` batches print the
//      running mean loss and running accuracy.
//   2. Evaluate: model.valid() on the fixed-order test split.
//   3. Checkpoint: always overwrite "latest"; overwrite "best"
//      when the test accuracy beats the best so far.
//
// Burn specifics:
//   - Training runs on B (Autodiff<...>), evaluation on
//     B::InnerBackend; both batchers share one device, because
//     an autodiff backend's Device is its inner backend's Device.
//   - loss.backward() returns a fresh gradient set every step,
//     so there is nothing to zero between steps.
//   - optim.step() consumes the model and returns the updated
//     one; step N+1 always sees the parameters written by step N.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    augment::TrainAugmentation,
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
    loader::TrainLoader,
};
use crate::domain::{checkpoint_policy::CheckpointPolicy, metrics::RunningMetrics};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluator::{accuracy_of, evaluate},
    model::{count_correct, ImageClassifier},
};

/// What a finished run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs:        Vec<EpochMetrics>,
    pub best_accuracy: f64,
    /// Epoch currently stored in the best slot, if any
    pub best_epoch:    Option<usize>,
}

/// Where the loop is, for the periodic status line
#[derive(Debug, Clone, Copy)]
struct EpochProgress {
    epoch:             usize,
    batches_per_epoch: usize,
    log_interval:      usize,
    learning_rate:     f64,
}

impl EpochProgress {
    /// 1-based iteration counter across all epochs
    fn global_iteration(&self, batch_index: usize) -> usize {
        batch_index + 1 + (self.epoch - 1) * self.batches_per_epoch
    }

    fn should_report(&self, batch_index: usize) -> bool {
        self.log_interval > 0 && (batch_index + 1) % self.log_interval == 0
    }
}

pub fn run_training<B, M>(
    cfg:            &TrainConfig,
    model:          M,
    train_dataset:  ImageDataset,
    test_dataset:   ImageDataset,
    ckpt_manager:   &CheckpointManager,
    metrics_logger: &MetricsLogger,
    device:         B::Device,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
{
    if test_dataset.sample_count() == 0 {
        anyhow::bail!("test split is empty; accuracy would be undefined");
    }

    // ── Adam optimiser, fixed learning rate ───────────────────────────────────
    let mut optim = AdamConfig::new().init();
    let loss_fn   = CrossEntropyLossConfig::new().init(&device);

    // ── Training loader (AutodiffBackend, shuffled, augmented) ────────────────
    // Workers prefetch augmented batches; 0 means build them on this thread.
    let mut train_loader = TrainLoader::new(
        train_dataset.augmented(TrainAugmentation::default()),
        ImageBatcher::<B>::new(device.clone()),
        cfg.batch_size,
        cfg.num_workers,
        cfg.seed,
    );
    let batches_per_epoch = train_loader.batches_per_epoch();

    // ── Test data loader (InnerBackend, fixed order, no augmentation) ─────────
    // Single-threaded: worker threads would interleave batches.
    let test_batcher = ImageBatcher::<B::InnerBackend>::new(device.clone());
    let test_loader  = DataLoaderBuilder::new(test_batcher)
        .batch_size(cfg.batch_size)
        .build(test_dataset);

    let mut model   = model;
    let mut policy  = CheckpointPolicy::new();
    let mut summary = TrainingSummary::default();

    tracing::info!("Start Training!");

    for epoch in 1..=cfg.epochs {
        tracing::info!("Training Epoch: {}", epoch);

        let progress = EpochProgress {
            epoch,
            batches_per_epoch,
            log_interval:  cfg.log_interval,
            learning_rate: cfg.lr,
        };
        let (trained, train_metrics) =
            train_epoch(model, &mut optim, &loss_fn, train_loader.epoch(), progress);
        model = trained;

        // ── Evaluation: the inner module only lives for this block ────────────
        let test_metrics = {
            let model_valid = model.valid();
            evaluate(&model_valid, test_loader.iter())
        };
        let accuracy = accuracy_of(&test_metrics)?;

        // ── Checkpoints ───────────────────────────────────────────────────────
        let decision = policy.observe(epoch, accuracy);
        for slot in decision.slots() {
            tracing::info!("Saving {} model......", slot);
            ckpt_manager.save_model(&model, slot)?;
        }

        tracing::info!(
            "Test Acc is: {:.2}% (Best Acc: {:.2}%)",
            accuracy * 100.0,
            decision.best_accuracy * 100.0,
        );

        let row = EpochMetrics::new(
            epoch,
            train_metrics.mean_loss().unwrap_or(f64::NAN),
            train_metrics.accuracy().unwrap_or(0.0),
            accuracy,
            decision.best_accuracy,
            decision.save_best,
        );
        metrics_logger.log(&row)?;
        summary.epochs.push(row);
    }

    summary.best_accuracy = policy.best_accuracy();
    summary.best_epoch    = policy.best_epoch();

    tracing::info!("Training Finished, TotalEPOCH={}", cfg.epochs);
    Ok(summary)
}

/// One pass over the training batches. Returns the updated
/// model and the metrics accumulated since the epoch began.
fn train_epoch<B, M, O>(
    mut model: M,
    optim:     &mut O,
    loss_fn:   &CrossEntropyLoss<B>,
    batches:   impl Iterator<Item = ImageBatch<B>>,
    progress:  EpochProgress,
) -> (M, RunningMetrics)
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    O: Optimizer<M, B>,
{
    let mut metrics = RunningMetrics::new();

    for (i, batch) in batches.enumerate() {
        let count  = batch.len();
        let logits = model.forward(batch.images);
        let loss   = loss_fn.forward(logits.clone(), batch.targets.clone());

        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
        let correct = count_correct(logits, batch.targets);

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(progress.learning_rate, model, grads);

        metrics.record_batch(loss_value, correct, count);

        if progress.should_report(i) {
            tracing::info!(
                "[epoch:{}, iter:{}] Loss: {:.3} | Acc: {:.2}% ",
                progress.epoch,
                progress.global_iteration(i),
                metrics.mean_loss().unwrap_or(f64::NAN),
                metrics.accuracy().unwrap_or(0.0) * 100.0,
            );
        }
    }

    (model, metrics)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_iteration_counts_across_epochs() {
        let p = EpochProgress { epoch: 3, batches_per_epoch: 391, log_interval: 100, learning_rate: 0.01 };
        assert_eq!(p.global_iteration(99), 100 + 2 * 391);
    }

    #[test]
    fn test_report_every_interval() {
        let p = EpochProgress { epoch: 1, batches_per_epoch: 391, log_interval: 100, learning_rate: 0.01 };
        assert!(!p.should_report(0));
        assert!(p.should_report(99));
        assert!(!p.should_report(100));
        assert!(p.should_report(199));
    }

    #[test]
    fn test_zero_interval_never_reports() {
        let p = EpochProgress { epoch: 1, batches_per_epoch: 10, log_interval: 0, learning_rate: 0.01 };
        assert!(!p.should_report(99));
    }
}
