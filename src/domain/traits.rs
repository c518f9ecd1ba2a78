// ============================================================
// Layer 3: Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so a
// synthetic generator and a real log reader are
// interchangeable, and so is any scoring backend.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::{field::FieldSpec, sample::CtrSample};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce labelled impressions.
///
/// Implementations:
///   - SyntheticClickLog → seeded generator with a planted click model
pub trait SampleSource {
    /// Feature columns every produced sample carries.
    fn field_specs(&self) -> Vec<FieldSpec>;

    /// Load all available samples from this source.
    fn load_all(&self) -> Result<Vec<CtrSample>>;
}

// ─── ClickPredictor ───────────────────────────────────────────────────────────
/// Any component that can score a single impression.
///
/// Implementations:
///   - PredictUseCase → restores a trained AFM network from disk
pub trait ClickPredictor {
    /// Score for the sample: a probability for logistic models,
    /// the raw regression output otherwise. The label is ignored.
    fn predict(&self, sample: &CtrSample) -> Result<f32>;
}
