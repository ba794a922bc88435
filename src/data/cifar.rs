// ============================================================
// Layer 4 — CIFAR-10 Binary Reader
// ============================================================
// Reads the "binary version" of CIFAR-10:
//
//   <data_dir>/
//     data_batch_1.bin ... data_batch_5.bin   ← training split
//     test_batch.bin                          ← test split
//     batches.meta.txt                        ← class names (optional)
//
// Each .bin file is a flat run of 3073-byte records:
//   byte 0         label (0..=9)
//   bytes 1..1025  red plane,   32x32 row-major
//   bytes 1025..   green plane, then blue plane
//
// That is exactly the CHW byte layout of ImageSample, so a
// record is copied without reordering.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::domain::{
    sample::{ImageSample, DEFAULT_CLASS_NAMES, NUM_CLASSES, PIXELS_PER_IMAGE},
    traits::SampleSource,
};

/// Label byte plus one image
pub const RECORD_LEN: usize = 1 + PIXELS_PER_IMAGE;

pub const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];

pub const TEST_FILE: &str = "test_batch.bin";

pub const META_FILE: &str = "batches.meta.txt";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read dataset file '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset file '{path}' has {len} bytes, not a whole number of 3073-byte records")]
    Truncated { path: PathBuf, len: usize },

    #[error("dataset file '{path}' contains no records")]
    Empty { path: PathBuf },

    #[error("record {index} of '{path}' has label {label}, expected 0..{max}")]
    BadLabel {
        path:  PathBuf,
        index: usize,
        label: u8,
        max:   usize,
    },
}

/// Decode every record in `bytes`. `path` is only used for errors.
pub fn parse_records(bytes: &[u8], path: &Path) -> Result<Vec<ImageSample>, DatasetError> {
    if bytes.is_empty() {
        return Err(DatasetError::Empty { path: path.to_path_buf() });
    }
    if bytes.len() % RECORD_LEN != 0 {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            len:  bytes.len(),
        });
    }

    bytes
        .chunks_exact(RECORD_LEN)
        .enumerate()
        .map(|(index, record)| {
            let label = record[0];
            if label as usize >= NUM_CLASSES {
                return Err(DatasetError::BadLabel {
                    path: path.to_path_buf(),
                    index,
                    label,
                    max: NUM_CLASSES,
                });
            }
            Ok(ImageSample::new(record[1..].to_vec(), label as usize))
        })
        .collect()
}

/// Read and decode one batch file
pub fn read_batch_file(path: &Path) -> Result<Vec<ImageSample>, DatasetError> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&bytes, path)
}

/// CIFAR-10 rooted at a directory holding the binary batches.
#[derive(Debug, Clone)]
pub struct Cifar10Source {
    dir: PathBuf,
}

impl Cifar10Source {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_files(&self, names: &[&str]) -> Result<Vec<ImageSample>> {
        let mut samples = Vec::new();
        for name in names {
            let path  = self.dir.join(name);
            let batch = read_batch_file(&path).with_context(|| {
                format!(
                    "Cannot load CIFAR-10 from '{}'. Download the binary version \
                     and extract it there.",
                    self.dir.display()
                )
            })?;
            tracing::debug!("Read {} samples from '{}'", batch.len(), path.display());
            samples.extend(batch);
        }
        Ok(samples)
    }
}

impl SampleSource for Cifar10Source {
    fn train_split(&self) -> Result<Vec<ImageSample>> {
        self.read_files(&TRAIN_FILES)
    }

    fn test_split(&self) -> Result<Vec<ImageSample>> {
        self.read_files(&[TEST_FILE])
    }

    fn class_names(&self) -> Vec<String> {
        let from_meta = fs::read_to_string(self.dir.join(META_FILE))
            .ok()
            .map(|text| parse_class_names(&text))
            .filter(|names| names.len() == NUM_CLASSES);

        from_meta.unwrap_or_else(|| DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

/// One class name per non-blank line
fn parse_class_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![fill; RECORD_LEN];
        r[0] = label;
        r
    }

    #[test]
    fn test_parse_two_records() {
        let mut bytes = record(3, 10);
        bytes.extend(record(9, 20));
        let samples = parse_records(&bytes, Path::new("x.bin")).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label, 3);
        assert_eq!(samples[1].label, 9);
        assert_eq!(samples[0].pixels.len(), PIXELS_PER_IMAGE);
        assert!(samples[1].pixels.iter().all(|&p| p == 20));
    }

    #[test]
    fn test_plane_order_is_preserved() {
        let mut bytes = record(0, 0);
        // first red byte, first green byte, last blue byte
        bytes[1] = 11;
        bytes[1 + 1024] = 22;
        bytes[RECORD_LEN - 1] = 33;
        let s = &parse_records(&bytes, Path::new("x.bin")).unwrap()[0];
        assert_eq!(s.pixel(0, 0, 0), 11);
        assert_eq!(s.pixel(1, 0, 0), 22);
        assert_eq!(s.pixel(2, 31, 31), 33);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let bytes = vec![0u8; RECORD_LEN + 5];
        let err = parse_records(&bytes, Path::new("x.bin")).unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { len, .. } if len == RECORD_LEN + 5));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let err = parse_records(&[], Path::new("x.bin")).unwrap_err();
        assert!(matches!(err, DatasetError::Empty { .. }));
    }

    #[test]
    fn test_out_of_range_label_is_rejected() {
        let mut bytes = record(1, 0);
        bytes.extend(record(10, 0));
        let err = parse_records(&bytes, Path::new("x.bin")).unwrap_err();
        assert!(matches!(err, DatasetError::BadLabel { index: 1, label: 10, .. }));
    }

    #[test]
    fn test_source_reads_splits_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (i, name) in TRAIN_FILES.iter().enumerate() {
            fs::write(dir.path().join(name), record(i as u8, 0)).unwrap();
        }
        let mut test_bytes = record(7, 1);
        test_bytes.extend(record(8, 2));
        fs::write(dir.path().join(TEST_FILE), test_bytes).unwrap();

        let source = Cifar10Source::new(dir.path());
        let train  = source.train_split().unwrap();
        let test   = source.test_split().unwrap();

        assert_eq!(train.iter().map(|s| s.label).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(test.len(), 2);
        assert_eq!(source.class_names()[0], "plane");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let source = Cifar10Source::new("/definitely/not/here");
        let err = source.test_split().unwrap_err();
        assert!(format!("{err:#}").contains("test_batch.bin"));
    }

    #[test]
    fn test_class_names_come_from_meta_file() {
        let dir = tempfile::tempdir().unwrap();
        let names = "airplane\nautomobile\nbird\ncat\ndeer\ndog\nfrog\nhorse\nship\ntruck\n\n";
        fs::write(dir.path().join(META_FILE), names).unwrap();
        let source = Cifar10Source::new(dir.path());
        let classes = source.class_names();
        assert_eq!(classes.len(), 10);
        assert_eq!(classes[1], "automobile");
    }
}
