// ============================================================
// Layer 3 — Image Sample
// ============================================================
// One labelled image as it comes off disk: 3 channel planes
// of 32x32 bytes (R, then G, then B, each row-major) plus an
// integer class label.

use serde::{Deserialize, Serialize};

/// Height and width of every image
pub const IMAGE_SIZE: usize = 32;

/// Colour channels per image (RGB)
pub const CHANNELS: usize = 3;

/// Bytes in one channel plane
pub const PLANE_LEN: usize = IMAGE_SIZE * IMAGE_SIZE;

/// Bytes in one full image
pub const PIXELS_PER_IMAGE: usize = CHANNELS * PLANE_LEN;

/// Number of target classes
pub const NUM_CLASSES: usize = 10;

/// Fallback class names when the dataset ships no metadata file
pub const DEFAULT_CLASS_NAMES: [&str; NUM_CLASSES] = [
    "plane", "car", "bird", "cat", "deer",
    "dog", "frog", "horse", "ship", "truck",
];

/// A single labelled image in channel-major (CHW) byte layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// `PIXELS_PER_IMAGE` bytes, `pixels[c * PLANE_LEN + y * IMAGE_SIZE + x]`
    pub pixels: Vec<u8>,
    /// Class index in `0..NUM_CLASSES`
    pub label: usize,
}

impl ImageSample {
    pub fn new(pixels: Vec<u8>, label: usize) -> Self {
        debug_assert_eq!(pixels.len(), PIXELS_PER_IMAGE);
        Self { pixels, label }
    }

    /// Byte at channel `c`, row `y`, column `x`
    pub fn pixel(&self, c: usize, y: usize, x: usize) -> u8 {
        self.pixels[index(c, y, x)]
    }
}

/// Flat CHW index of a pixel
pub fn index(c: usize, y: usize, x: usize) -> usize {
    c * PLANE_LEN + y * IMAGE_SIZE + x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_channel_major() {
        assert_eq!(index(0, 0, 0), 0);
        assert_eq!(index(0, 0, 31), 31);
        assert_eq!(index(0, 1, 0), 32);
        assert_eq!(index(1, 0, 0), 1024);
        assert_eq!(index(2, 31, 31), PIXELS_PER_IMAGE - 1);
    }

    #[test]
    fn test_pixel_lookup() {
        let mut pixels = vec![0u8; PIXELS_PER_IMAGE];
        pixels[index(2, 5, 7)] = 200;
        let sample = ImageSample::new(pixels, 3);
        assert_eq!(sample.pixel(2, 5, 7), 200);
        assert_eq!(sample.pixel(1, 5, 7), 0);
    }
}
