// ============================================================
// Layer 4 — Image Dataset
// ============================================================
// Wraps a Vec<ImageSample> in Burn's Dataset trait so the
// DataLoader can call .get(index) and .len() on it. The
// training split is additionally wrapped in a MapperDataset
// that runs TrainAugmentation on every .get().

use burn::data::dataset::{transform::MapperDataset, Dataset};

use crate::data::augment::TrainAugmentation;
use crate::domain::sample::ImageSample;

/// Training split with augmentation applied lazily per access
pub type AugmentedDataset = MapperDataset<ImageDataset, TrainAugmentation, ImageSample>;

#[derive(Debug, Clone)]
pub struct ImageDataset {
    samples: Vec<ImageSample>,
}

impl ImageDataset {
    pub fn new(samples: Vec<ImageSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Wrap this dataset so every access returns a freshly augmented copy
    pub fn augmented(self, augmentation: TrainAugmentation) -> AugmentedDataset {
        MapperDataset::new(self, augmentation)
    }
}

impl Dataset<ImageSample> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::PIXELS_PER_IMAGE;

    #[test]
    fn test_get_and_len() {
        let ds = ImageDataset::new(vec![
            ImageSample::new(vec![1; PIXELS_PER_IMAGE], 0),
            ImageSample::new(vec![2; PIXELS_PER_IMAGE], 5),
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, 5);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_augmented_dataset_keeps_labels() {
        let ds = ImageDataset::new(vec![ImageSample::new(vec![9; PIXELS_PER_IMAGE], 6)])
            .augmented(TrainAugmentation::default());
        assert_eq!(ds.len(), 1);
        let item = ds.get(0).unwrap();
        assert_eq!(item.label, 6);
        assert_eq!(item.pixels.len(), PIXELS_PER_IMAGE);
    }
}
