// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Writes one CSV row per epoch to <outf>/metrics.csv:
//
//   epoch,train_loss,train_acc,test_acc,best_acc,saved_best
//   1,1.734512,0.365420,0.481200,0.481200,1
//   2,1.301877,0.529860,0.472900,0.481200,0
//   ...
//
// The file is recreated at the start of every training run,
// matching the checkpoint slots which are overwritten too.
// Accuracies are ratios in [0, 1].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const CSV_HEADER: &str = "epoch,train_loss,train_acc,test_acc,best_acc,saved_best";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean of the per-batch cross-entropy losses
    pub train_loss: f64,

    /// Running training accuracy at the end of the epoch
    pub train_acc: f64,

    /// Accuracy on the test split after the epoch
    pub test_acc: f64,

    /// Best test accuracy up to and including this epoch
    pub best_acc: f64,

    /// Whether this epoch overwrote the best checkpoint
    pub saved_best: bool,
}

impl EpochMetrics {
    pub fn new(
        epoch:      usize,
        train_loss: f64,
        train_acc:  f64,
        test_acc:   f64,
        best_acc:   f64,
        saved_best: bool,
    ) -> Self {
        Self { epoch, train_loss, train_acc, test_acc, best_acc, saved_best }
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.6},{}",
            self.epoch,
            self.train_loss,
            self.train_acc,
            self.test_acc,
            self.best_acc,
            u8::from(self.saved_best),
        )
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
#[derive(Debug, Clone)]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create (or truncate) `<dir>/metrics.csv` and write the header.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{CSV_HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_acc={:.4}",
            m.epoch,
            m.train_loss,
            m.test_acc,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
