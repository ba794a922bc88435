// ============================================================
// Layer 4 — Training Augmentation
// ============================================================
// Applied to the training split only, once per sample per epoch:
//
//   1. Random crop: pad the 32x32 image with 4 zero pixels on
//      every side (40x40), then cut a 32x32 window at a random
//      offset in 0..=8 on each axis.
//   2. Random horizontal flip with probability 0.5.
//
// Augmentation works on raw bytes, before normalisation, so
// the zero padding is black in pixel space.
//
// TrainAugmentation implements Burn's Mapper trait and is
// wrapped around the training dataset with MapperDataset; the
// DataLoader workers then run it in parallel.

use burn::data::dataset::transform::Mapper;
use rand::Rng;

use crate::domain::sample::{index, ImageSample, CHANNELS, IMAGE_SIZE, PIXELS_PER_IMAGE};

pub const CROP_PADDING: usize = 4;

pub const FLIP_PROBABILITY: f64 = 0.5;

/// Cut the 32x32 window whose top-left corner sits at (`dy`, `dx`)
/// in the zero-padded image. `dy`, `dx` range over `0..=2 * padding`;
/// (padding, padding) returns the image unchanged.
pub fn crop_at(sample: &ImageSample, padding: usize, dy: usize, dx: usize) -> ImageSample {
    let mut pixels = vec![0u8; PIXELS_PER_IMAGE];

    for c in 0..CHANNELS {
        for y in 0..IMAGE_SIZE {
            let sy = y + dy;
            if sy < padding || sy >= padding + IMAGE_SIZE {
                continue;
            }
            for x in 0..IMAGE_SIZE {
                let sx = x + dx;
                if sx < padding || sx >= padding + IMAGE_SIZE {
                    continue;
                }
                pixels[index(c, y, x)] = sample.pixel(c, sy - padding, sx - padding);
            }
        }
    }

    ImageSample::new(pixels, sample.label)
}

pub fn random_crop<R: Rng + ?Sized>(sample: &ImageSample, padding: usize, rng: &mut R) -> ImageSample {
    let dy = rng.gen_range(0..=2 * padding);
    let dx = rng.gen_range(0..=2 * padding);
    crop_at(sample, padding, dy, dx)
}

/// Mirror every row left-to-right
pub fn horizontal_flip(sample: &ImageSample) -> ImageSample {
    let mut pixels = vec![0u8; PIXELS_PER_IMAGE];
    for c in 0..CHANNELS {
        for y in 0..IMAGE_SIZE {
            for x in 0..IMAGE_SIZE {
                pixels[index(c, y, IMAGE_SIZE - 1 - x)] = sample.pixel(c, y, x);
            }
        }
    }
    ImageSample::new(pixels, sample.label)
}

/// Crop-with-padding followed by a coin-flip mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainAugmentation {
    pub padding:   usize,
    pub flip_prob: f64,
}

impl Default for TrainAugmentation {
    fn default() -> Self {
        Self { padding: CROP_PADDING, flip_prob: FLIP_PROBABILITY }
    }
}

impl TrainAugmentation {
    pub fn apply<R: Rng + ?Sized>(&self, sample: &ImageSample, rng: &mut R) -> ImageSample {
        let cropped = random_crop(sample, self.padding, rng);
        if rng.gen_bool(self.flip_prob) {
            horizontal_flip(&cropped)
        } else {
            cropped
        }
    }
}

impl Mapper<ImageSample, ImageSample> for TrainAugmentation {
    fn map(&self, item: &ImageSample) -> ImageSample {
        self.apply(item, &mut rand::thread_rng())
    }
}
