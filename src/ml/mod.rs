// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model and optimisation code:
//
//   model.rs     — the ImageClassifier contract + architecture choice
//   lenet.rs     — LeNet-5 for 32x32 RGB
//   densenet.rs  — DenseNet-BC, CIFAR configuration
//   device.rs    — one-time accelerator/CPU decision
//   trainer.rs   — epoch loop: train, evaluate, checkpoint
//   evaluator.rs — a single no-grad pass over a split

/// Forward-pass contract and model selection
pub mod model;

/// LeNet architecture
pub mod lenet;

/// DenseNet architecture
pub mod densenet;

/// Accelerator detection and device choice
pub mod device;

/// Full training loop with evaluation and checkpointing
pub mod trainer;

/// Evaluation pass over a split
pub mod evaluator;
