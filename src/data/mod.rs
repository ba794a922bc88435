// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From CIFAR-10 binary files to device-resident tensor batches:
//
//   *.bin files
//       │
//       ▼
//   Cifar10Source      → parses records into ImageSamples
//       │
//       ▼
//   ImageDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   TrainAugmentation  → random crop + flip (training split only)
//       │
//       ▼
//   ImageBatcher       → normalises and stacks into tensors
//       │
//       ▼
//   TrainLoader        → shuffles and prefetches training batches
//   DataLoader (Burn)  → fixed-order test batches
//
// Why two loaders?
//   The training split is reshuffled every epoch and augmented
//   on worker threads; the test split is read once per epoch
//   in file order. Both yield batches in a fixed, known order,
//   so only the final batch of a pass can be short.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the CIFAR-10 binary batches
pub mod cifar;

/// Random crop with padding and horizontal flip
pub mod augment;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Ordered, prefetching loader for the training split
pub mod loader;
