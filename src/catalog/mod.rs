//! Platform catalog and architecture recommendations
//!
//! Both are JSON documents keyed by name, loaded once and checked
//! against the ontology so every platform scores every capability.

pub mod models;

pub use models::{ArchitectureOption, Platform};

use crate::document::{parse_document, read_document, to_document_string};
use crate::error::{EvalError, Result};
use crate::ontology::{models::check_level, CapabilityScores, Ontology};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Platforms keyed by name, in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    platforms: IndexMap<String, Platform>,
}

impl Catalog {
    /// Build a catalog, naming each platform after its key and validating
    /// it against `ontology`
    pub fn new(mut platforms: IndexMap<String, Platform>, ontology: &Ontology) -> Result<Self> {
        for (name, platform) in platforms.iter_mut() {
            platform.name = name.clone();
        }
        let catalog = Self { platforms };
        catalog.validate(ontology)?;
        Ok(catalog)
    }

    pub fn from_json(text: &str, origin: &str, ontology: &Ontology) -> Result<Self> {
        let platforms: IndexMap<String, Platform> = parse_document(text, origin)?;
        Self::new(platforms, ontology)
    }

    pub fn load(path: &Path, ontology: &Ontology) -> Result<Self> {
        let platforms: IndexMap<String, Platform> = read_document(path)?;
        let catalog = Self::new(platforms, ontology)?;
        info!("Loaded {} platforms from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String> {
        to_document_string(self)
    }

    /// Every platform scores every ontology capability, on scale, and nothing else
    pub fn validate(&self, ontology: &Ontology) -> Result<()> {
        if self.platforms.is_empty() {
            return Err(EvalError::invalid("catalog defines no platforms"));
        }

        for (name, platform) in &self.platforms {
            check_scores(name, &platform.capabilities, ontology)?;
        }
        Ok(())
    }

    /// Replace a platform's capability scores, e.g. with scores extracted
    /// from live vendor documentation. Returns the catalog name.
    pub fn overlay_scores(
        &mut self,
        name: &str,
        scores: CapabilityScores,
        ontology: &Ontology,
    ) -> Result<String> {
        let key = self.find(name)?.name.clone();
        check_scores(&key, &scores, ontology)?;
        if let Some(platform) = self.platforms.get_mut(&key) {
            platform.capabilities = scores;
        }
        info!("Overlaid capability scores on {}", key);
        Ok(key)
    }

    pub fn get(&self, name: &str) -> Result<&Platform> {
        self.platforms
            .get(name)
            .ok_or_else(|| EvalError::unknown("platform", name))
    }

    /// Case-insensitive lookup, for command-line convenience
    pub fn find(&self, name: &str) -> Result<&Platform> {
        self.platforms
            .get(name)
            .or_else(|| {
                self.platforms
                    .values()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| EvalError::unknown("platform", name))
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

fn check_scores(name: &str, scores: &CapabilityScores, ontology: &Ontology) -> Result<()> {
    for capability in ontology.capability_keys() {
        let score = scores
            .get(capability)
            .copied()
            .ok_or_else(|| EvalError::MissingScore {
                platform: name.to_string(),
                capability: capability.to_string(),
            })?;
        check_level(score, || format!("platform '{}' capability '{}'", name, capability))?;
    }
    if let Some(extra) = scores.keys().find(|k| ontology.capability(k).is_err()) {
        return Err(EvalError::invalid(format!(
            "platform '{}' scores unknown capability '{}'",
            name, extra
        )));
    }
    Ok(())
}

/// Architecture recommendation options keyed by label ("Option A", ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArchitectureCatalog {
    options: IndexMap<String, ArchitectureOption>,
}

impl ArchitectureCatalog {
    pub fn new(mut options: IndexMap<String, ArchitectureOption>) -> Result<Self> {
        for (label, option) in options.iter_mut() {
            option.label = label.clone();
            if !(0.0..=1.0).contains(&option.fit_score) {
                return Err(EvalError::invalid(format!(
                    "architecture '{}' has fit score {} outside [0, 1]",
                    label, option.fit_score
                )));
            }
        }
        Ok(Self { options })
    }

    pub fn from_json(text: &str, origin: &str) -> Result<Self> {
        Self::new(parse_document(text, origin)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::new(read_document(path)?)
    }

    pub fn get(&self, label: &str) -> Option<&ArchitectureOption> {
        self.options.get(label)
    }

    pub fn options(&self) -> impl Iterator<Item = &ArchitectureOption> {
        self.options.values()
    }

    /// Resolve labels in the order given
    pub fn select(&self, labels: &[String]) -> Result<Vec<&ArchitectureOption>> {
        labels
            .iter()
            .map(|label| {
                self.get(label)
                    .ok_or_else(|| EvalError::unknown("architecture option", label.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> Ontology {
        Ontology::from_json(
            r#"{
              "capabilities": {
                "delivery": { "label": "Delivery", "facets": [], "scale": "0-3", "importance": "critical" },
                "workflow": { "label": "Workflow", "facets": [], "scale": "0-3", "importance": "high" }
              },
              "use_cases": {},
              "business_outcomes": {}
            }"#,
            "test",
        )
        .unwrap()
    }

    fn platform_json(scores: &str) -> String {
        format!(
            r#"{{ "Sanity": {{
                "type": "Headless CMS", "category": "headless", "deployment": "SaaS",
                "cost_band": "$$", "summary": "Structured content",
                "capabilities": {} }} }}"#,
            scores
        )
    }

    #[test]
    fn test_load_names_platforms() {
        let catalog = Catalog::from_json(
            &platform_json(r#"{ "delivery": 3, "workflow": 2 }"#),
            "test",
            &ontology(),
        )
        .unwrap();
        assert_eq!(catalog.get("Sanity").unwrap().name, "Sanity");
        assert_eq!(catalog.find("sanity").unwrap().name, "Sanity");
        assert!(catalog.get("Drupal").is_err());
    }

    #[test]
    fn test_missing_capability_rejected() {
        let err = Catalog::from_json(&platform_json(r#"{ "delivery": 3 }"#), "test", &ontology())
            .unwrap_err();
        match err {
            EvalError::MissingScore { platform, capability } => {
                assert_eq!(platform, "Sanity");
                assert_eq!(capability, "workflow");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_score_above_scale_rejected() {
        let result = Catalog::from_json(
            &platform_json(r#"{ "delivery": 5, "workflow": 2 }"#),
            "test",
            &ontology(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_capability_rejected() {
        let result = Catalog::from_json(
            &platform_json(r#"{ "delivery": 1, "workflow": 2, "seo": 1 }"#),
            "test",
            &ontology(),
        );
        assert!(result.unwrap_err().to_string().contains("seo"));
    }

    #[test]
    fn test_overlay_scores() {
        let ontology = ontology();
        let mut catalog = Catalog::from_json(
            &platform_json(r#"{ "delivery": 3, "workflow": 2 }"#),
            "test",
            &ontology,
        )
        .unwrap();

        let scores: CapabilityScores =
            [("delivery".to_string(), 2), ("workflow".to_string(), 3)].into_iter().collect();
        let name = catalog.overlay_scores("sanity", scores, &ontology).unwrap();
        assert_eq!(name, "Sanity");
        assert_eq!(catalog.get("Sanity").unwrap().score("workflow"), Some(3));

        let partial: CapabilityScores = [("delivery".to_string(), 1)].into_iter().collect();
        let err = catalog.overlay_scores("Sanity", partial, &ontology).unwrap_err();
        assert!(matches!(err, EvalError::MissingScore { .. }));
        // Rejected overlays leave the platform untouched
        assert_eq!(catalog.get("Sanity").unwrap().score("delivery"), Some(2));

        let err = catalog
            .overlay_scores("Drupal", CapabilityScores::new(), &ontology)
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownIdentifier { .. }));
    }

    #[test]
    fn test_architecture_select() {
        let archs = ArchitectureCatalog::from_json(
            r#"{ "Option B": {
                "title": "Pure Headless", "stack": ["Contentful"], "pros": ["Flexible"],
                "cons": ["Needs front-end team"], "fit_score": 0.85, "verdict": "Long-term"
            } }"#,
            "test",
        )
        .unwrap();
        let picked = archs.select(&["Option B".to_string()]).unwrap();
        assert_eq!(picked[0].label, "Option B");
        assert!(archs.select(&["Option Z".to_string()]).is_err());
    }
}
