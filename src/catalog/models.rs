//! Data models for the platform catalog

use crate::ontology::CapabilityScores;
use serde::{Deserialize, Serialize};

/// A CMS vendor platform with descriptive metadata and capability scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Filled from the catalog key on load
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type")]
    pub platform_type: String,
    pub category: String,
    pub deployment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_band: Option<String>,
    pub cost_band: String,
    pub summary: String,
    pub capabilities: CapabilityScores,
}

impl Platform {
    pub fn score(&self, capability: &str) -> Option<u8> {
        self.capabilities.get(capability).copied()
    }
}

/// A recommended architecture pattern that can be attached to a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureOption {
    /// Filled from the document key on load
    #[serde(skip)]
    pub label: String,
    pub title: String,
    pub stack: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub fit_score: f64,
    pub verdict: String,
}
