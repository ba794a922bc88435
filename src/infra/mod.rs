// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the ML and application layers:
//
//   checkpoint.rs — the latest/best parameter slots and the saved
//                   run config, via Burn's file recorders
//   metrics.rs    — per-epoch CSV log
//   logging.rs    — tracing subscriber writing to stdout and to
//                   a log file in the output directory

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Console + file log setup
pub mod logging;
