//! Capability scoring
//!
//! - Use-case fit: mean of `min(1, actual / required)` per required capability,
//!   averaged over the selected use cases
//! - Business fit: mean raw capability score divided by the scale maximum
//! - Composite: `0.6 * use_case_fit + 0.4 * business_fit`, clamped to [0, 1]

pub mod models;
pub mod scorer;

pub use models::{OutcomeWeights, ScoreCard, Selection, BUSINESS_WEIGHT, USE_CASE_WEIGHT};
pub use scorer::{capability_fit, composite_score, CapabilityScorer};
