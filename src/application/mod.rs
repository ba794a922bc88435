// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Wires the data, ML and infrastructure layers together for
// one goal each. No tensor math here and no argument parsing
// (that's Layer 1); only workflow coordination.

// The training workflow
pub mod train_use_case;

// Re-evaluating a saved checkpoint
pub mod eval_use_case;
