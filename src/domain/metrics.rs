// ============================================================
// Layer 3 — Running Metrics
// ============================================================
// Additive accumulators for one pass over a split:
//   - loss_sum: sum of per-batch mean losses (training only)
//   - correct:  predictions matching the label
//   - total:    samples seen
//   - batches:  batches seen
//
// A fresh RunningMetrics is created at the start of every
// training epoch and every evaluation pass. Values are read
// for the periodic status line and the end-of-epoch report.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMetrics {
    loss_sum: f64,
    correct:  usize,
    total:    usize,
    batches:  usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one training batch: its mean loss, how many of its
    /// `count` samples were predicted correctly.
    pub fn record_batch(&mut self, loss: f64, correct: usize, count: usize) {
        debug_assert!(correct <= count);
        self.loss_sum += loss;
        self.record_predictions(correct, count);
    }

    /// Record one evaluation batch (no loss is tracked there).
    pub fn record_predictions(&mut self, correct: usize, count: usize) {
        debug_assert!(correct <= count);
        self.correct += correct;
        self.total   += count;
        self.batches += 1;
    }

    /// Mean of the per-batch losses seen so far
    pub fn mean_loss(&self) -> Option<f64> {
        (self.batches > 0).then(|| self.loss_sum / self.batches as f64)
    }

    /// correct / total as a ratio in [0, 1]; None before any sample
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }

    pub fn correct(&self) -> usize { self.correct }

    pub fn total(&self) -> usize { self.total }

    pub fn batches(&self) -> usize { self.batches }
}
