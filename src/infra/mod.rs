// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// ML layer: weight checkpoints, saved configurations, and
// the CSV metrics series written during training.
//
// Reference: Burn Book §5 (Records and Checkpointing)

/// Saves/loads weights with CompactRecorder plus JSON configs
pub mod checkpoint;

/// Tagged scalar series appended to metrics.csv
pub mod metrics;
