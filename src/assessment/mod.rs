//! Platform assessments
//!
//! An assessment is produced either by the local scorer (deterministic)
//! or by the LLM evaluator. Both share this shape so reports do not care
//! where it came from.

use crate::ontology::CapabilityScores;
use serde::{Deserialize, Serialize};

/// Number of strengths and of weaknesses carried by an assessment
pub const NARRATIVE_ITEMS: usize = 3;

/// Where an assessment came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentSource {
    Local,
    Llm { provider: String, model: String },
}

impl AssessmentSource {
    pub fn describe(&self) -> String {
        match self {
            AssessmentSource::Local => "local capability scoring".to_string(),
            AssessmentSource::Llm { provider, model } => format!("{} ({})", provider, model),
        }
    }
}

/// Structured assessment of one platform against the ontology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAssessment {
    pub platform: String,
    pub capability_scores: CapabilityScores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub best_for_use_case: String,
    pub overall_fit_score: f64,
    pub source: AssessmentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlatformAssessment {
    pub fn is_ai_generated(&self) -> bool {
        matches!(self.source, AssessmentSource::Llm { .. })
    }
}
