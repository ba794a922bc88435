// ============================================================
// Layer 3 — Checkpoint Policy
// ============================================================
// Two slots, "latest" and "best".
//
//   after every evaluation  → write latest
//   accuracy > best so far  → write best, best = accuracy
//
// Best accuracy starts at 0.0 and never decreases. Ties keep
// the earlier epoch in the best slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two places a parameter snapshot can be written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSlot {
    Latest,
    Best,
}

impl CheckpointSlot {
    /// File stem inside the output directory (the recorder adds
    /// its own extension)
    pub fn file_stem(self) -> &'static str {
        match self {
            CheckpointSlot::Latest => "net_latest",
            CheckpointSlot::Best   => "net_best",
        }
    }
}

impl fmt::Display for CheckpointSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointSlot::Latest => write!(f, "latest"),
            CheckpointSlot::Best   => write!(f, "best"),
        }
    }
}

/// What to write after one evaluation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointDecision {
    /// Always true: latest is overwritten every epoch
    pub save_latest: bool,
    /// True only when the accuracy beat the previous best
    pub save_best:   bool,
    /// Best accuracy after taking this observation into account
    pub best_accuracy: f64,
}

impl CheckpointDecision {
    /// Slots to write, latest first
    pub fn slots(&self) -> Vec<CheckpointSlot> {
        let mut slots = Vec::with_capacity(2);
        if self.save_latest {
            slots.push(CheckpointSlot::Latest);
        }
        if self.save_best {
            slots.push(CheckpointSlot::Best);
        }
        slots
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckpointPolicy {
    best_accuracy: f64,
    best_epoch:    Option<usize>,
}

impl CheckpointPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }

    /// Epoch whose parameters currently sit in the best slot
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    /// Feed the test accuracy of `epoch` and get back which slots
    /// to overwrite.
    pub fn observe(&mut self, epoch: usize, accuracy: f64) -> CheckpointDecision {
        let save_best = accuracy > self.best_accuracy;
        if save_best {
            self.best_accuracy = accuracy;
            self.best_epoch    = Some(epoch);
        }
        CheckpointDecision {
            save_latest: true,
            save_best,
            best_accuracy: self.best_accuracy,
        }
    }
}
