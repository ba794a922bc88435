// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait: turns a Vec<ImageSample>
// into one ImageBatch on the target device.
//
// What is a Batcher?
//   The loaders hand it a list of individual samples and it
//   stacks them into tensors with the batch as the first axis.
//   It owns the device, so every batch is created where the
//   model lives and the training loop never moves tensors.
//
// How batching works here:
//   Input:  N samples of 3x32x32 bytes
//   Output: images  [N, 3, 32, 32] f32, normalised per channel
//           targets [N]            int, class labels
//
//   Every sample is already in CHW order, so the bytes of all
//   N samples are normalised into one flat Vec and reshaped:
//   [s1_r..., s1_g..., s1_b..., s2_r..., ...] → [N, 3, 32, 32]
//
// Why normalise per channel?
//   x = (byte / 255 - mean[c]) / std[c] centres each colour
//   channel around zero with unit spread, using statistics of
//   the CIFAR-10 training set. The test split uses the same
//   constants, never its own.
//
// The last batch of an epoch may hold fewer than batch_size
// samples; nothing here assumes a fixed N.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::sample::{ImageSample, CHANNELS, IMAGE_SIZE, PLANE_LEN};

/// Per-channel mean/std applied after scaling bytes to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; CHANNELS],
    pub std:  [f32; CHANNELS],
}

impl Normalization {
    /// Statistics of the CIFAR-10 training set
    pub const CIFAR10: Normalization = Normalization {
        mean: [0.4914, 0.4822, 0.4465],
        std:  [0.2023, 0.1994, 0.2010],
    };

    pub fn apply(&self, channel: usize, byte: u8) -> f32 {
        (byte as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self::CIFAR10
    }
}

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// shape: [batch_size, 3, 32, 32]
    pub images: Tensor<B, 4>,

    /// shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the device every batch is created on, so the training
/// loop never moves tensors itself.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device:        B::Device,
    pub normalization: Normalization,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, normalization: Normalization::default() }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| {
                s.pixels
                    .iter()
                    .enumerate()
                    .map(|(i, &byte)| self.normalization.apply(i / PLANE_LEN, byte))
            })
            .collect();

        let labels: Vec<i64> = items.iter().map(|s| s.label as i64).collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, IMAGE_SIZE, IMAGE_SIZE]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::domain::sample::{index, PIXELS_PER_IMAGE};

    type TestBackend = NdArray;

    #[test]
    fn test_normalization_of_extremes() {
        let n = Normalization::CIFAR10;
        let zero = n.apply(0, 0);
        let full = n.apply(2, 255);
        assert!((zero - (-0.4914 / 0.2023)).abs() < 1e-5);
        assert!((full - ((1.0 - 0.4465) / 0.2010)).abs() < 1e-5);
    }

    #[test]
    fn test_batch_shapes_and_values() {
        let mut pixels = vec![0u8; PIXELS_PER_IMAGE];
        pixels[index(1, 2, 3)] = 255;
        let items = vec![
            ImageSample::new(pixels, 4),
            ImageSample::new(vec![0u8; PIXELS_PER_IMAGE], 9),
            ImageSample::new(vec![0u8; PIXELS_PER_IMAGE], 0),
        ];

        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 3, 32, 32]);
        assert_eq!(batch.len(), 3);

        let targets = batch.targets.into_data().to_vec::<i64>().unwrap();
        assert_eq!(targets, vec![4, 9, 0]);

        let images = batch.images.into_data().to_vec::<f32>().unwrap();
        let bright = images[index(1, 2, 3)];
        let dark   = images[index(1, 2, 4)];
        assert!((bright - Normalization::CIFAR10.apply(1, 255)).abs() < 1e-5);
        assert!((dark - Normalization::CIFAR10.apply(1, 0)).abs() < 1e-5);
        // second sample starts right after the first
        let second_first = images[PIXELS_PER_IMAGE];
        assert!((second_first - Normalization::CIFAR10.apply(0, 0)).abs() < 1e-5);
    }

    #[test]
    fn test_custom_normalization() {
        let identity = Normalization { mean: [0.0; 3], std: [1.0; 3] };
        let batcher  = ImageBatcher::<TestBackend> {
            device:        Default::default(),
            normalization: identity,
        };
        let batch = batcher.batch(vec![ImageSample::new(vec![255u8; PIXELS_PER_IMAGE], 1)]);
        let images = batch.images.into_data().to_vec::<f32>().unwrap();
        assert!(images.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
