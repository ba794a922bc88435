// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training pipeline only depends on these traits, so the
// concrete dataset reader can be swapped (e.g. for a synthetic
// in-memory source in tests) without touching the use cases.

use anyhow::Result;
use crate::domain::sample::ImageSample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out the train and test splits of a
/// labelled image dataset.
///
/// Implementations:
///   - Cifar10Source → reads the CIFAR-10 binary batches
///   - InMemorySource → fixed vectors, used by tests
pub trait SampleSource {
    /// Training split, in file order (the loader shuffles)
    fn train_split(&self) -> Result<Vec<ImageSample>>;

    /// Test split, in file order
    fn test_split(&self) -> Result<Vec<ImageSample>>;

    /// Human-readable class names, indexed by label
    fn class_names(&self) -> Vec<String>;
}

/// A source backed by two vectors held in memory.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub train:   Vec<ImageSample>,
    pub test:    Vec<ImageSample>,
    pub classes: Vec<String>,
}

#[cfg(test)]
impl SampleSource for InMemorySource {
    fn train_split(&self) -> Result<Vec<ImageSample>> {
        Ok(self.train.clone())
    }

    fn test_split(&self) -> Result<Vec<ImageSample>> {
        Ok(self.test.clone())
    }

    fn class_names(&self) -> Vec<String> {
        self.classes.clone()
    }
}
