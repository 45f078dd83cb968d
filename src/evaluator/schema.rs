//! Assessment response schema and strict validation of model output

use crate::assessment::NARRATIVE_ITEMS;
use crate::error::{EvalError, Result};
use crate::llm::extract_json;
use crate::ontology::{CapabilityScores, Ontology, MAX_LEVEL, MIN_LEVEL};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Object schema with one required 0-3 integer per ontology capability
pub(crate) fn capability_scores_schema(ontology: &Ontology) -> Value {
    let mut score_properties = Map::new();
    for key in ontology.capability_keys() {
        score_properties.insert(
            key.to_string(),
            json!({
                "type": "integer",
                "minimum": MIN_LEVEL,
                "maximum": MAX_LEVEL
            }),
        );
    }
    let required_scores: Vec<&str> = ontology.capability_keys().collect();
    json!({
        "type": "object",
        "properties": score_properties,
        "required": required_scores,
        "additionalProperties": false
    })
}

/// JSON schema sent with every evaluation request
///
/// Every ontology capability is a required integer property, so providers
/// with constrained decoding cannot omit one.
pub fn assessment_schema(ontology: &Ontology) -> Value {
    let use_cases: Vec<&str> = ontology.use_case_keys().collect();

    let narrative = json!({
        "type": "array",
        "items": {"type": "string"},
        "minItems": NARRATIVE_ITEMS,
        "maxItems": NARRATIVE_ITEMS
    });

    json!({
        "type": "object",
        "properties": {
            "platform": {"type": "string"},
            "capability_scores": capability_scores_schema(ontology),
            "strengths": narrative.clone(),
            "weaknesses": narrative,
            "best_for_use_case": {"type": "string", "enum": use_cases},
            "overall_fit_score": {"type": "number", "minimum": 0.0, "maximum": 1.0}
        },
        "required": [
            "platform",
            "capability_scores",
            "strengths",
            "weaknesses",
            "best_for_use_case",
            "overall_fit_score"
        ],
        "additionalProperties": false
    })
}

/// Model output exactly as received. No field has a default: a missing
/// field fails deserialization.
#[derive(Debug, Deserialize)]
pub struct RawAssessment {
    pub platform: String,
    pub capability_scores: IndexMap<String, i64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub best_for_use_case: String,
    pub overall_fit_score: f64,
}

/// Fields of a model response that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAssessment {
    pub capability_scores: CapabilityScores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Ontology use-case key
    pub best_for_use_case: String,
    pub overall_fit_score: f64,
}

/// Parse and validate model text for `platform`
pub fn parse_assessment(
    platform: &str,
    raw_text: &str,
    ontology: &Ontology,
) -> Result<ValidatedAssessment> {
    let violation = |message: String| EvalError::SchemaViolation {
        platform: platform.to_string(),
        message,
    };

    let raw: RawAssessment = serde_json::from_str(extract_json(raw_text))
        .map_err(|e| violation(e.to_string()))?;

    validate(platform, raw, ontology)
}

fn validate(platform: &str, raw: RawAssessment, ontology: &Ontology) -> Result<ValidatedAssessment> {
    let violation = |message: String| EvalError::SchemaViolation {
        platform: platform.to_string(),
        message,
    };

    let capability_scores = validate_scores(&raw.capability_scores, ontology).map_err(violation)?;

    let strengths = narrative_items("strengths", raw.strengths).map_err(violation)?;
    let weaknesses = narrative_items("weaknesses", raw.weaknesses).map_err(violation)?;

    let best_for_use_case = resolve_use_case(ontology, &raw.best_for_use_case).ok_or_else(|| {
        violation(format!("unknown use case '{}'", raw.best_for_use_case))
    })?;

    if !raw.overall_fit_score.is_finite() || !(0.0..=1.0).contains(&raw.overall_fit_score) {
        return Err(violation(format!(
            "overall_fit_score {} outside [0, 1]",
            raw.overall_fit_score
        )));
    }

    Ok(ValidatedAssessment {
        capability_scores,
        strengths,
        weaknesses,
        best_for_use_case,
        overall_fit_score: raw.overall_fit_score,
    })
}

/// Every ontology capability scored on scale, nothing else, in ontology order
pub(crate) fn validate_scores(
    raw: &IndexMap<String, i64>,
    ontology: &Ontology,
) -> std::result::Result<CapabilityScores, String> {
    if let Some(unknown) = raw
        .keys()
        .find(|k| !ontology.capabilities().contains_key(k.as_str()))
    {
        return Err(format!("unknown capability '{}'", unknown));
    }

    let mut scores = CapabilityScores::new();
    for key in ontology.capability_keys() {
        let score = *raw
            .get(key)
            .ok_or_else(|| format!("missing score for capability '{}'", key))?;
        if score < i64::from(MIN_LEVEL) || score > i64::from(MAX_LEVEL) {
            return Err(format!(
                "score {} for '{}' outside {}-{}",
                score, key, MIN_LEVEL, MAX_LEVEL
            ));
        }
        scores.insert(key.to_string(), score as u8);
    }
    Ok(scores)
}

fn narrative_items(field: &str, items: Vec<String>) -> std::result::Result<Vec<String>, String> {
    if items.len() != NARRATIVE_ITEMS {
        return Err(format!(
            "{} must hold exactly {} items, got {}",
            field,
            NARRATIVE_ITEMS,
            items.len()
        ));
    }
    let trimmed: Vec<String> = items.into_iter().map(|s| s.trim().to_string()).collect();
    if trimmed.iter().any(String::is_empty) {
        return Err(format!("{} contains an empty item", field));
    }
    Ok(trimmed)
}

/// Accept a use-case key, or its label case-insensitively
fn resolve_use_case(ontology: &Ontology, answer: &str) -> Option<String> {
    let answer = answer.trim();
    if ontology.use_cases().contains_key(answer) {
        return Some(answer.to_string());
    }
    ontology
        .use_cases()
        .iter()
        .find(|(_, uc)| uc.label.eq_ignore_ascii_case(answer))
        .map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> Ontology {
        Ontology::from_json(
            r#"{
                "capabilities": {
                    "delivery": {"label": "Delivery", "facets": ["api"], "scale": "0-3", "importance": "critical"},
                    "workflow": {"label": "Workflow", "facets": ["approvals"], "scale": "0-3", "importance": "high"}
                },
                "use_cases": {
                    "marketing_site": {"label": "Marketing Site", "required_capabilities": {"delivery": 2}}
                },
                "business_outcomes": {
                    "conversion": {"label": "Conversion", "weight": 1.0}
                }
            }"#,
            "test",
        )
        .unwrap()
    }

    fn response(overrides: Value) -> String {
        let mut base = json!({
            "platform": "Sanity",
            "capability_scores": {"delivery": 3, "workflow": 2},
            "strengths": ["APIs", "Realtime", "Developer experience"],
            "weaknesses": ["Cost", "Editors", "Hosting"],
            "best_for_use_case": "marketing_site",
            "overall_fit_score": 0.8
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                if v.is_null() {
                    base.remove(k);
                } else {
                    base.insert(k.clone(), v.clone());
                }
            }
        }
        base.to_string()
    }

    #[test]
    fn test_schema_requires_every_capability() {
        let schema = assessment_schema(&ontology());
        let required = schema["properties"]["capability_scores"]["required"]
            .as_array()
            .unwrap();
        assert_eq!(required.len(), 2);
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["strengths"]["minItems"], 3);
        assert_eq!(schema["required"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_valid_response() {
        let parsed = parse_assessment("Sanity", &response(json!({})), &ontology()).unwrap();
        assert_eq!(parsed.capability_scores["delivery"], 3);
        assert_eq!(parsed.best_for_use_case, "marketing_site");
        assert_eq!(parsed.strengths.len(), 3);
    }

    #[test]
    fn test_missing_weaknesses_is_violation() {
        let err = parse_assessment("Sanity", &response(json!({"weaknesses": null})), &ontology())
            .unwrap_err();
        match err {
            EvalError::SchemaViolation { platform, message } => {
                assert_eq!(platform, "Sanity");
                assert!(message.contains("weaknesses"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_score() {
        let text = response(json!({"capability_scores": {"delivery": 4, "workflow": 2}}));
        let err = parse_assessment("Sanity", &text, &ontology()).unwrap_err();
        assert!(err.to_string().contains("outside 0-3"));
    }

    #[test]
    fn test_missing_and_unknown_capabilities() {
        let text = response(json!({"capability_scores": {"delivery": 2}}));
        assert!(parse_assessment("Sanity", &text, &ontology()).is_err());

        let text = response(json!({"capability_scores": {"delivery": 2, "workflow": 1, "search": 3}}));
        let err = parse_assessment("Sanity", &text, &ontology()).unwrap_err();
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn test_narrative_count_enforced() {
        let text = response(json!({"strengths": ["only one"]}));
        let err = parse_assessment("Sanity", &text, &ontology()).unwrap_err();
        assert!(err.to_string().contains("exactly 3"));
    }

    #[test]
    fn test_use_case_label_accepted() {
        let text = response(json!({"best_for_use_case": "marketing site"}));
        let parsed = parse_assessment("Sanity", &text, &ontology()).unwrap();
        assert_eq!(parsed.best_for_use_case, "marketing_site");

        let text = response(json!({"best_for_use_case": "intranet"}));
        assert!(parse_assessment("Sanity", &text, &ontology()).is_err());
    }

    #[test]
    fn test_fit_score_bounds() {
        let text = response(json!({"overall_fit_score": 1.2}));
        assert!(parse_assessment("Sanity", &text, &ontology()).is_err());
    }

    #[test]
    fn test_non_json_is_violation() {
        let err = parse_assessment("Sanity", "I cannot help with that.", &ontology()).unwrap_err();
        assert!(matches!(err, EvalError::SchemaViolation { .. }));
    }
}
