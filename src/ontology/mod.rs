//! CMS capability ontology
//!
//! The ontology is a data document listing:
//! - capabilities (scored dimensions on a 0-3 scale)
//! - use cases (minimum required level per capability)
//! - business outcomes (relative weights)
//!
//! It is loaded once at startup and shared read-only.

pub mod models;

pub use models::{
    BusinessOutcome, Capability, CapabilityScores, Importance, UseCase, MAX_LEVEL, MIN_LEVEL,
    SCALE_LABEL,
};

use crate::document::{parse_document, read_document, to_document_string};
use crate::error::{EvalError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Loaded ontology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ontology {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    capabilities: IndexMap<String, Capability>,
    use_cases: IndexMap<String, UseCase>,
    business_outcomes: IndexMap<String, BusinessOutcome>,
}

impl Ontology {
    /// Build and validate an ontology from its parts
    pub fn new(
        capabilities: IndexMap<String, Capability>,
        use_cases: IndexMap<String, UseCase>,
        business_outcomes: IndexMap<String, BusinessOutcome>,
    ) -> Result<Self> {
        let ontology = Self {
            version: None,
            capabilities,
            use_cases,
            business_outcomes,
        };
        ontology.validate()?;
        Ok(ontology)
    }

    /// Parse and validate an ontology document
    pub fn from_json(text: &str, origin: &str) -> Result<Self> {
        let ontology: Ontology = parse_document(text, origin)?;
        ontology.validate()?;
        Ok(ontology)
    }

    /// Load and validate the ontology document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let ontology: Ontology = read_document(path)?;
        ontology.validate()?;
        info!(
            "Loaded ontology from {}: {} capabilities, {} use cases, {} outcomes",
            path.display(),
            ontology.capabilities.len(),
            ontology.use_cases.len(),
            ontology.business_outcomes.len()
        );
        Ok(ontology)
    }

    /// Serialize back to the document layout
    pub fn to_json(&self) -> Result<String> {
        to_document_string(self)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.capabilities.is_empty() {
            return Err(EvalError::invalid("ontology defines no capabilities"));
        }

        for (key, cap) in &self.capabilities {
            if cap.label.trim().is_empty() {
                return Err(EvalError::invalid(format!("capability '{}' has an empty label", key)));
            }
            match cap.scale_bounds() {
                Some((MIN_LEVEL, MAX_LEVEL)) => {}
                _ => {
                    return Err(EvalError::invalid(format!(
                        "capability '{}' uses scale '{}', expected '{}'",
                        key, cap.scale, SCALE_LABEL
                    )));
                }
            }
        }

        for (key, use_case) in &self.use_cases {
            if use_case.required_capabilities.is_empty() {
                return Err(EvalError::invalid(format!(
                    "use case '{}' requires no capabilities",
                    key
                )));
            }
            for (cap_key, level) in &use_case.required_capabilities {
                if !self.capabilities.contains_key(cap_key) {
                    return Err(EvalError::invalid(format!(
                        "use case '{}' references unknown capability '{}'",
                        key, cap_key
                    )));
                }
                models::check_level(*level, || format!("use case '{}' requirement '{}'", key, cap_key))?;
            }
        }

        for (key, outcome) in &self.business_outcomes {
            if !outcome.weight.is_finite() || !(0.0..=1.0).contains(&outcome.weight) {
                return Err(EvalError::invalid(format!(
                    "business outcome '{}' has weight {} outside [0, 1]",
                    key, outcome.weight
                )));
            }
        }

        let total: f64 = self.business_outcomes.values().map(|o| o.weight).sum();
        if !self.business_outcomes.is_empty() && (total - 1.0).abs() > 1e-6 {
            warn!("Business outcome weights sum to {:.3}, not 1.0", total);
        }

        Ok(())
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn capability(&self, key: &str) -> Result<&Capability> {
        self.capabilities
            .get(key)
            .ok_or_else(|| EvalError::unknown("capability", key))
    }

    pub fn use_case(&self, key: &str) -> Result<&UseCase> {
        self.use_cases
            .get(key)
            .ok_or_else(|| EvalError::unknown("use case", key))
    }

    pub fn business_outcome(&self, key: &str) -> Result<&BusinessOutcome> {
        self.business_outcomes
            .get(key)
            .ok_or_else(|| EvalError::unknown("business outcome", key))
    }

    pub fn capabilities(&self) -> &IndexMap<String, Capability> {
        &self.capabilities
    }

    pub fn use_cases(&self) -> &IndexMap<String, UseCase> {
        &self.use_cases
    }

    pub fn business_outcomes(&self) -> &IndexMap<String, BusinessOutcome> {
        &self.business_outcomes
    }

    pub fn capability_keys(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    pub fn use_case_keys(&self) -> impl Iterator<Item = &str> {
        self.use_cases.keys().map(String::as_str)
    }

    /// Default outcome weights as configured in the document
    pub fn default_outcome_weights(&self) -> IndexMap<String, f64> {
        self.business_outcomes
            .iter()
            .map(|(k, o)| (k.clone(), o.weight))
            .collect()
    }

    /// Content hash used to key cached assessments.
    /// Any edit to the document changes the hash.
    pub fn content_hash(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        // Serializing plain maps of strings and numbers cannot fail
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "capabilities": {
    "delivery": {
      "label": "Delivery & API",
      "facets": ["api_maturity"],
      "scale": "0-3",
      "importance": "critical"
    },
    "workflow": {
      "label": "Workflow & Governance",
      "facets": [],
      "scale": "0-3",
      "importance": "high"
    }
  },
  "use_cases": {
    "paid_landing_pages": {
      "label": "Paid landing pages",
      "required_capabilities": { "delivery": 2 }
    }
  },
  "business_outcomes": {
    "conversion_lift": { "label": "Conversion", "weight": 1.0 }
  }
}"#;

    #[test]
    fn test_parse_and_lookup() {
        let ontology = Ontology::from_json(SAMPLE, "sample").unwrap();
        assert_eq!(ontology.capabilities().len(), 2);
        assert_eq!(ontology.capability("delivery").unwrap().importance, Importance::Critical);
        assert_eq!(
            ontology.use_case("paid_landing_pages").unwrap().required_capabilities["delivery"],
            2
        );
        assert!(ontology.use_case("nope").is_err());
        assert_eq!(ontology.capability_keys().collect::<Vec<_>>(), vec!["delivery", "workflow"]);
    }

    #[test]
    fn test_unknown_capability_in_use_case() {
        let text = SAMPLE.replace("{ \"delivery\": 2 }", "{ \"seo\": 2 }");
        let err = Ontology::from_json(&text, "sample").unwrap_err();
        assert!(err.to_string().contains("seo"));
    }

    #[test]
    fn test_requirement_above_scale() {
        let text = SAMPLE.replace("{ \"delivery\": 2 }", "{ \"delivery\": 4 }");
        assert!(Ontology::from_json(&text, "sample").is_err());
    }

    #[test]
    fn test_bad_scale_rejected() {
        let text = SAMPLE.replacen("\"0-3\"", "\"1-5\"", 1);
        let err = Ontology::from_json(&text, "sample").unwrap_err();
        assert!(err.to_string().contains("1-5"));
    }

    #[test]
    fn test_weight_out_of_range() {
        let text = SAMPLE.replace("\"weight\": 1.0", "\"weight\": 1.5");
        assert!(Ontology::from_json(&text, "sample").is_err());
    }

    #[test]
    fn test_content_hash_tracks_edits() {
        let a = Ontology::from_json(SAMPLE, "sample").unwrap();
        let b = Ontology::from_json(SAMPLE, "sample").unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);

        let edited = SAMPLE.replace("{ \"delivery\": 2 }", "{ \"delivery\": 3 }");
        let c = Ontology::from_json(&edited, "sample").unwrap();
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let ontology = Ontology::from_json(SAMPLE, "sample").unwrap();
        let text = ontology.to_json().unwrap();
        let reparsed = Ontology::from_json(&text, "roundtrip").unwrap();
        assert_eq!(ontology, reparsed);
        assert!(text.find("delivery").unwrap() < text.find("workflow").unwrap());
    }
}
