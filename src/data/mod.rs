// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// From a sample source all the way to tensor batches:
//
//   SampleSource (SyntheticClickLog)
//       │
//       ▼
//   split_train_val   → seeded shuffle, train / validation
//       │
//       ▼
//   CtrDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   CtrBatcher        → pads id lists, builds a FeatureBatch
//       │
//       ▼
//   DataLoader        → feeds batches to the trainer
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Seeded click log generator with a planted click model
pub mod synthetic;

/// Implements Burn's Dataset trait for CTR samples
pub mod dataset;

/// Implements Burn's Batcher trait to create feature batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
