//! Capability scorer: use-case fit, business fit and composite score

use super::models::*;
use crate::assessment::{AssessmentSource, PlatformAssessment, NARRATIVE_ITEMS};
use crate::catalog::{Catalog, Platform};
use crate::error::{EvalError, Result};
use crate::metrics::METRICS;
use crate::ontology::{CapabilityScores, Ontology, MAX_LEVEL};
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::debug;

/// Credit for one required capability: full once `actual` meets `required`,
/// linear below it. A requirement of 0 is always met.
pub fn capability_fit(actual: u8, required: u8) -> f64 {
    if required == 0 {
        return 1.0;
    }
    (actual as f64 / required as f64).min(1.0)
}

/// Blend use-case fit and business fit, clamped to [0, 1]
pub fn composite_score(use_case_fit: f64, business_fit: f64) -> f64 {
    (USE_CASE_WEIGHT * use_case_fit + BUSINESS_WEIGHT * business_fit).clamp(0.0, 1.0)
}

/// Pure scoring over a shared ontology
#[derive(Debug, Clone, Copy)]
pub struct CapabilityScorer<'a> {
    ontology: &'a Ontology,
}

impl<'a> CapabilityScorer<'a> {
    pub fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    pub fn ontology(&self) -> &'a Ontology {
        self.ontology
    }

    /// Mean capability fit over the capabilities `use_case` requires
    pub fn use_case_fit(
        &self,
        platform: &str,
        scores: &CapabilityScores,
        use_case: &str,
    ) -> Result<f64> {
        let required = &self.ontology.use_case(use_case)?.required_capabilities;
        let mut total = 0.0;
        for (capability, level) in required {
            let actual = lookup(platform, scores, capability)?;
            total += capability_fit(actual, *level);
        }
        // Ontology validation guarantees at least one requirement
        Ok(total / required.len() as f64)
    }

    /// Fit for each selected use case, in selection order.
    /// An empty selection is rejected.
    pub fn use_case_fits(
        &self,
        platform: &str,
        scores: &CapabilityScores,
        use_cases: &[String],
    ) -> Result<IndexMap<String, f64>> {
        if use_cases.is_empty() {
            return Err(EvalError::invalid(
                "at least one use case must be selected to compute use-case fit",
            ));
        }
        let mut fits = IndexMap::with_capacity(use_cases.len());
        for key in use_cases {
            if fits.contains_key(key) {
                continue;
            }
            let fit = self.use_case_fit(platform, scores, key)?;
            fits.insert(key.clone(), fit);
        }
        Ok(fits)
    }

    /// Unweighted mean of the per-use-case fits
    pub fn mean_use_case_fit(
        &self,
        platform: &str,
        scores: &CapabilityScores,
        use_cases: &[String],
    ) -> Result<f64> {
        let fits = self.use_case_fits(platform, scores, use_cases)?;
        Ok(mean(fits.values().copied()))
    }

    /// Mean score over every ontology capability, divided by the scale maximum.
    /// Outcome weights do not enter this formula.
    pub fn business_fit(&self, platform: &str, scores: &CapabilityScores) -> Result<f64> {
        let mut total = 0.0;
        for capability in self.ontology.capability_keys() {
            total += lookup(platform, scores, capability)? as f64;
        }
        let count = self.ontology.capabilities().len() as f64;
        Ok((total / count / MAX_LEVEL as f64).min(1.0))
    }

    /// Check selected outcome weights against the ontology and normalize them
    pub fn resolve_weights(&self, weights: &OutcomeWeights) -> Result<OutcomeWeights> {
        if weights.is_empty() {
            return Ok(OutcomeWeights::new(self.ontology.default_outcome_weights()).normalized());
        }
        for (key, weight) in weights.iter() {
            self.ontology.business_outcome(key)?;
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(EvalError::invalid(format!(
                    "outcome weight for '{}' is {}, expected a value in [0, 1]",
                    key, weight
                )));
            }
        }
        Ok(weights.normalized())
    }

    /// Full score card for arbitrary capability scores
    pub fn score(
        &self,
        platform: &str,
        scores: &CapabilityScores,
        selection: &Selection,
    ) -> Result<ScoreCard> {
        let outcome_weights = self.resolve_weights(&selection.outcome_weights)?;
        let use_case_fits = self.use_case_fits(platform, scores, &selection.use_cases)?;
        let use_case_fit = mean(use_case_fits.values().copied());
        let business_fit = self.business_fit(platform, scores)?;
        let composite = composite_score(use_case_fit, business_fit);

        debug!(
            "Scored {}: use_case_fit={:.3} business_fit={:.3} composite={:.3}",
            platform, use_case_fit, business_fit, composite
        );

        Ok(ScoreCard {
            platform: platform.to_string(),
            use_case_fits,
            use_case_fit,
            business_fit,
            composite,
            outcome_weights,
        })
    }

    pub fn score_platform(&self, platform: &Platform, selection: &Selection) -> Result<ScoreCard> {
        let card = self.score(&platform.name, &platform.capabilities, selection)?;
        METRICS.record_platform_scored();
        Ok(card)
    }

    /// Score an assessment's capability scores (e.g. from the LLM)
    pub fn score_assessment(
        &self,
        assessment: &PlatformAssessment,
        selection: &Selection,
    ) -> Result<ScoreCard> {
        self.score(&assessment.platform, &assessment.capability_scores, selection)
    }

    /// Score every catalog platform, best composite first.
    /// Ties keep catalog order.
    pub fn rank(&self, catalog: &Catalog, selection: &Selection) -> Result<Vec<ScoreCard>> {
        let mut cards = catalog
            .platforms()
            .map(|p| self.score_platform(p, selection))
            .collect::<Result<Vec<_>>>()?;
        cards.sort_by(|a, b| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(Ordering::Equal)
        });
        Ok(cards)
    }

    /// Deterministic assessment derived from the catalog scores
    pub fn assess(&self, platform: &Platform, selection: &Selection) -> Result<PlatformAssessment> {
        let card = self.score_platform(platform, selection)?;

        let mut ranked: Vec<(&str, u8)> = self
            .ontology
            .capability_keys()
            .map(|k| lookup(&platform.name, &platform.capabilities, k).map(|s| (k, s)))
            .collect::<Result<_>>()?;

        // Stable sorts keep ontology order among equal scores
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let strengths = ranked
            .iter()
            .take(NARRATIVE_ITEMS)
            .map(|(k, s)| self.describe(k, *s))
            .collect::<Result<Vec<_>>>()?;

        ranked.sort_by(|a, b| a.1.cmp(&b.1));
        let weaknesses = ranked
            .iter()
            .take(NARRATIVE_ITEMS)
            .map(|(k, s)| self.describe(k, *s))
            .collect::<Result<Vec<_>>>()?;

        let best_for_use_case = card
            .best_use_case()
            .map(|(k, _)| k.to_string())
            .unwrap_or_default();

        Ok(PlatformAssessment {
            platform: platform.name.clone(),
            capability_scores: platform.capabilities.clone(),
            strengths,
            weaknesses,
            best_for_use_case,
            overall_fit_score: card.composite,
            source: AssessmentSource::Local,
            notes: Some(format!(
                "Scored against {} use case(s): use-case fit {:.2}, business fit {:.2}",
                card.use_case_fits.len(),
                card.use_case_fit,
                card.business_fit
            )),
        })
    }

    fn describe(&self, capability: &str, score: u8) -> Result<String> {
        let label = &self.ontology.capability(capability)?.label;
        Ok(format!("{} ({}/{})", label, score, MAX_LEVEL))
    }
}

fn lookup(platform: &str, scores: &CapabilityScores, capability: &str) -> Result<u8> {
    scores
        .get(capability)
        .copied()
        .ok_or_else(|| EvalError::MissingScore {
            platform: platform.to_string(),
            capability: capability.to_string(),
        })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> Ontology {
        Ontology::from_json(
            r#"{
              "capabilities": {
                "content_modeling": { "label": "Content Modeling", "facets": [], "scale": "0-3", "importance": "critical" },
                "delivery": { "label": "Delivery & API", "facets": [], "scale": "0-3", "importance": "critical" },
                "personalization": { "label": "Personalization", "facets": [], "scale": "0-3", "importance": "critical" },
                "integrations": { "label": "Integrations", "facets": [], "scale": "0-3", "importance": "high" }
              },
              "use_cases": {
                "paid_landing_pages": {
                  "label": "Paid landing pages",
                  "required_capabilities": { "personalization": 2, "delivery": 2, "integrations": 2 }
                },
                "brochure": {
                  "label": "Brochure site",
                  "required_capabilities": { "content_modeling": 0 }
                }
              },
              "business_outcomes": {
                "conversion_lift": { "label": "Conversion", "weight": 0.5 },
                "flexibility": { "label": "Flexibility", "weight": 0.5 }
              }
            }"#,
            "test",
        )
        .unwrap()
    }

    fn scores(values: [u8; 4]) -> CapabilityScores {
        ["content_modeling", "delivery", "personalization", "integrations"]
            .iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_capability_fit() {
        assert_eq!(capability_fit(3, 2), 1.0);
        assert_eq!(capability_fit(1, 2), 0.5);
        assert_eq!(capability_fit(0, 3), 0.0);
        assert_eq!(capability_fit(0, 0), 1.0);
    }

    #[test]
    fn test_use_case_fit_partial_credit() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        // personalization 1/2, delivery 3/2 -> 1, integrations 2/2
        let fit = scorer
            .use_case_fit("HubSpot", &scores([1, 3, 1, 2]), "paid_landing_pages")
            .unwrap();
        assert!((fit - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_requirement_is_met() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let fit = scorer
            .use_case_fit("Empty", &scores([0, 0, 0, 0]), "brochure")
            .unwrap();
        assert_eq!(fit, 1.0);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let err = scorer
            .score("X", &scores([1, 1, 1, 1]), &Selection::default())
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_unknown_use_case_rejected() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let err = scorer
            .score("X", &scores([1, 1, 1, 1]), &Selection::new(vec!["nope".to_string()]))
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownIdentifier { .. }));
    }

    #[test]
    fn test_missing_score_rejected() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let mut partial = scores([1, 1, 1, 1]);
        partial.shift_remove("integrations");
        let err = scorer.business_fit("Partial", &partial).unwrap_err();
        assert!(matches!(err, EvalError::MissingScore { .. }));
        assert!(err.to_string().contains("Partial"));
    }

    #[test]
    fn test_duplicate_use_cases_counted_once() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let selection = vec![
            "brochure".to_string(),
            "paid_landing_pages".to_string(),
            "brochure".to_string(),
        ];
        let fits = scorer
            .use_case_fits("X", &scores([0, 0, 0, 0]), &selection)
            .unwrap();
        assert_eq!(fits.len(), 2);
        let mean_fit = scorer
            .mean_use_case_fit("X", &scores([0, 0, 0, 0]), &selection)
            .unwrap();
        assert_eq!(mean_fit, 0.5);
    }

    #[test]
    fn test_weights_validated_and_normalized() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);

        let defaults = scorer.resolve_weights(&OutcomeWeights::default()).unwrap();
        assert_eq!(defaults.get("conversion_lift"), Some(0.5));

        let mut weights = OutcomeWeights::default();
        weights.set("conversion_lift", 0.2);
        weights.set("flexibility", 0.2);
        let resolved = scorer.resolve_weights(&weights).unwrap();
        assert_eq!(resolved.get("flexibility"), Some(0.5));

        weights.set("world_peace", 0.1);
        assert!(scorer.resolve_weights(&weights).is_err());
    }

    #[test]
    fn test_local_assessment() {
        let ontology = ontology();
        let scorer = CapabilityScorer::new(&ontology);
        let platform = Platform {
            name: "Contentful".to_string(),
            platform_type: "Headless CMS".to_string(),
            category: "headless".to_string(),
            deployment: "SaaS".to_string(),
            traffic_band: None,
            cost_band: "$$".to_string(),
            summary: "API-first".to_string(),
            capabilities: scores([3, 3, 1, 2]),
        };
        let selection = Selection::new(vec!["paid_landing_pages".to_string(), "brochure".to_string()]);
        let assessment = scorer.assess(&platform, &selection).unwrap();

        assert_eq!(assessment.source, AssessmentSource::Local);
        assert_eq!(assessment.strengths.len(), NARRATIVE_ITEMS);
        assert_eq!(assessment.weaknesses.len(), NARRATIVE_ITEMS);
        assert_eq!(assessment.strengths[0], "Content Modeling (3/3)");
        assert_eq!(assessment.weaknesses[0], "Personalization (1/3)");
        assert_eq!(assessment.best_for_use_case, "brochure");

        let before = METRICS.platforms_scored.get();
        let card = scorer.score_platform(&platform, &selection).unwrap();
        assert_eq!(assessment.overall_fit_score, card.composite);
        // Other tests share the global counter
        assert!(METRICS.platforms_scored.get() >= before + 1.0);
    }
}
