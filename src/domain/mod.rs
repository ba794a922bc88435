// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits for the core concepts of a
// training run. No Burn types and no file I/O live here, so
// everything in this layer is unit-testable without a device.
//
//   sample.rs            — one labelled 32x32 RGB image
//   metrics.rs           — running loss / accuracy accumulators
//   checkpoint_policy.rs — the latest/best slot state machine
//   traits.rs            — abstractions other layers implement

// A labelled image and the dataset constants around it
pub mod sample;

// Per-epoch and per-pass running metrics
pub mod metrics;

// Decides which checkpoint slots get written after an evaluation
pub mod checkpoint_policy;

// Core abstractions (traits) that other layers implement
pub mod traits;
