// ============================================================
// Layer 5 — Evaluation Pass
// ============================================================
// Runs a model over a split once, in loader order, and counts
// argmax hits. Callers pass the inner-backend module returned
// by `model.valid()`: no autodiff graph is recorded and
// batch-norm uses its running statistics. The module is dropped
// when the caller's scope ends, which ends eval mode with it.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::batcher::ImageBatch;
use crate::domain::metrics::RunningMetrics;
use crate::ml::model::{count_correct, ImageClassifier};

/// Accumulate correct/total over every batch
pub fn evaluate<B, M>(model: &M, batches: impl Iterator<Item = ImageBatch<B>>) -> RunningMetrics
where
    B: Backend,
    M: ImageClassifier<B>,
{
    let mut metrics = RunningMetrics::new();
    for batch in batches {
        let count  = batch.len();
        let logits = model.forward(batch.images);
        metrics.record_predictions(count_correct(logits, batch.targets), count);
    }
    metrics
}

/// correct / total of a finished pass; a pass that saw no
/// samples is an error rather than a division by zero.
pub fn accuracy_of(metrics: &RunningMetrics) -> Result<f64> {
    match metrics.accuracy() {
        Some(acc) => {
            tracing::debug!(
                "Evaluated {} images in {} batches, {} correct",
                metrics.total(),
                metrics.batches(),
                metrics.correct(),
            );
            Ok(acc)
        }
        None      => bail!("evaluation pass saw no samples; is the test split empty?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher};

    use crate::data::batcher::ImageBatcher;
    use crate::domain::sample::{ImageSample, PIXELS_PER_IMAGE};
    use crate::ml::lenet::LeNetConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device  = Default::default();
        let model   = LeNetConfig::new().init::<TestBackend>(&device);
        let batcher = ImageBatcher::<TestBackend>::new(device);

        let samples: Vec<ImageSample> = (0..7)
            .map(|i| ImageSample::new(vec![(i * 30) as u8; PIXELS_PER_IMAGE], i % 10))
            .collect();
        // 4 + 3: the last batch is short
        let batches = samples.chunks(4).map(|c| batcher.batch(c.to_vec()));

        let metrics = evaluate(&model, batches);
        assert_eq!(metrics.total(), 7);
        assert_eq!(metrics.batches(), 2);
        assert!(metrics.correct() <= 7);
        let acc = accuracy_of(&metrics).unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_empty_pass_is_an_error() {
        assert!(accuracy_of(&RunningMetrics::new()).is_err());
    }
}
