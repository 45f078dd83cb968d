//! Data models for the capability ontology

use crate::error::{EvalError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest level on the capability scale
pub const MIN_LEVEL: u8 = 0;
/// Highest level on the capability scale
pub const MAX_LEVEL: u8 = 3;
/// Scale label carried by every capability in the ontology document
pub const SCALE_LABEL: &str = "0-3";

/// Per-capability integer scores keyed by capability identifier
pub type CapabilityScores = IndexMap<String, u8>;

/// Importance tier of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    High,
    Medium,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Critical => "critical",
            Importance::High => "high",
            Importance::Medium => "medium",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored dimension of CMS functionality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub label: String,
    /// Descriptive only, never scored
    pub facets: Vec<String>,
    pub scale: String,
    pub importance: Importance,
}

impl Capability {
    /// Parse the `"min-max"` scale label
    pub fn scale_bounds(&self) -> Option<(u8, u8)> {
        let (lo, hi) = self.scale.split_once('-')?;
        Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?))
    }
}

/// Business scenario with minimum required capability levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCase {
    pub label: String,
    pub required_capabilities: IndexMap<String, u8>,
}

/// Strategic goal with a relative weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessOutcome {
    pub label: String,
    pub weight: f64,
}

/// Check that a raw level sits on the capability scale
pub fn check_level(level: u8, what: impl FnOnce() -> String) -> Result<()> {
    if level > MAX_LEVEL {
        return Err(EvalError::invalid(format!(
            "{} has level {} outside the {} scale",
            what(),
            level,
            SCALE_LABEL
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_bounds() {
        let cap = Capability {
            label: "Delivery".to_string(),
            facets: vec![],
            scale: "0-3".to_string(),
            importance: Importance::Critical,
        };
        assert_eq!(cap.scale_bounds(), Some((0, 3)));

        let bad = Capability {
            scale: "high".to_string(),
            ..cap
        };
        assert_eq!(bad.scale_bounds(), None);
    }

    #[test]
    fn test_importance_serde() {
        let json = serde_json::to_string(&Importance::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: Importance = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Importance::Medium);
    }

    #[test]
    fn test_check_level() {
        assert!(check_level(3, || "x".to_string()).is_ok());
        assert!(check_level(4, || "x".to_string()).is_err());
    }
}
