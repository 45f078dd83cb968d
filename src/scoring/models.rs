//! Inputs and outputs of the capability scorer

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Share of the composite taken by use-case fit
pub const USE_CASE_WEIGHT: f64 = 0.6;
/// Share of the composite taken by business fit
pub const BUSINESS_WEIGHT: f64 = 0.4;

/// Business-outcome weights chosen for an evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeWeights(IndexMap<String, f64>);

impl OutcomeWeights {
    pub fn new(weights: IndexMap<String, f64>) -> Self {
        Self(weights)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, weight: f64) {
        self.0.insert(key.into(), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rescale so the weights sum to 1. All-zero weights are returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|(k, v)| (k.clone(), v / total)).collect())
    }
}

/// User choices driving one scoring run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub outcome_weights: OutcomeWeights,
}

impl Selection {
    pub fn new(use_cases: Vec<String>) -> Self {
        Self {
            use_cases,
            outcome_weights: OutcomeWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: OutcomeWeights) -> Self {
        self.outcome_weights = weights;
        self
    }
}

/// Scores for one platform under one selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub platform: String,
    /// Fit per selected use case, in selection order
    pub use_case_fits: IndexMap<String, f64>,
    pub use_case_fit: f64,
    pub business_fit: f64,
    pub composite: f64,
    /// Normalized outcome weights the run was configured with
    #[serde(default)]
    pub outcome_weights: OutcomeWeights,
}

impl ScoreCard {
    /// Selected use case with the highest fit; the first wins ties
    pub fn best_use_case(&self) -> Option<(&str, f64)> {
        self.use_case_fits
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (k, v)| match best {
                Some((_, b)) if b >= *v => best,
                _ => Some((k.as_str(), *v)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_weights() {
        let mut weights = OutcomeWeights::default();
        weights.set("conversion_lift", 0.5);
        weights.set("cost_efficiency", 1.5);
        let normalized = weights.normalized();
        assert!((normalized.get("conversion_lift").unwrap() - 0.25).abs() < 1e-12);
        assert!((normalized.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_unchanged() {
        let mut weights = OutcomeWeights::default();
        weights.set("flexibility", 0.0);
        assert_eq!(weights.normalized(), weights);
    }

    #[test]
    fn test_best_use_case_prefers_first_on_tie() {
        let card = ScoreCard {
            platform: "Sanity".to_string(),
            use_case_fits: IndexMap::from([
                ("a".to_string(), 0.5),
                ("b".to_string(), 0.9),
                ("c".to_string(), 0.9),
            ]),
            use_case_fit: 0.77,
            business_fit: 0.5,
            composite: 0.66,
            outcome_weights: OutcomeWeights::default(),
        };
        assert_eq!(card.best_use_case(), Some(("b", 0.9)));
    }
}
