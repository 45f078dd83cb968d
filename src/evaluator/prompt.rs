//! Evaluation prompt construction

use crate::config::OrganizationContext;
use crate::ontology::{Ontology, SCALE_LABEL};
use std::fmt::Write;

/// Build the assessment prompt for `platform`
///
/// Without vendor context the model is told to rely on public
/// documentation it already knows.
pub fn build_prompt(
    platform: &str,
    ontology: &Ontology,
    organization: &OrganizationContext,
    vendor_context: Option<&str>,
) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a CMS evaluation expert. Assess the '{}' CMS platform.",
        platform
    );
    prompt.push('\n');

    let _ = writeln!(
        prompt,
        "Evaluate across these capabilities (scale {}, where 3 is excellent):",
        SCALE_LABEL
    );
    for (key, cap) in ontology.capabilities() {
        let _ = writeln!(
            prompt,
            "- {} ({}): {} [importance: {}]",
            key,
            cap.label,
            cap.facets.join(", "),
            cap.importance
        );
    }
    prompt.push('\n');

    prompt.push_str("Use cases:\n");
    for (key, use_case) in ontology.use_cases() {
        let _ = writeln!(prompt, "- {} ({})", key, use_case.label);
    }
    prompt.push('\n');

    prompt.push_str("CONTEXT:\n");
    match vendor_context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => {
            let _ = writeln!(prompt, "{}", context);
        }
        None => {
            let _ = writeln!(
                prompt,
                "Use your knowledge of {} from public documentation.",
                platform
            );
        }
    }
    prompt.push('\n');

    if !organization.requirements.is_empty() {
        let _ = writeln!(prompt, "{} REQUIREMENTS:", organization.name.to_uppercase());
        for requirement in &organization.requirements {
            let _ = writeln!(prompt, "- {}", requirement);
        }
        prompt.push('\n');
    }

    prompt.push_str("Provide your assessment as JSON with:\n");
    prompt.push_str("1. platform: the platform name\n");
    let _ = writeln!(
        prompt,
        "2. capability_scores: object mapping every capability key above to an integer score ({})",
        SCALE_LABEL
    );
    let _ = writeln!(prompt, "3. strengths: exactly 3 key strengths for {}", organization.name);
    let _ = writeln!(prompt, "4. weaknesses: exactly 3 key weaknesses for {}", organization.name);
    prompt.push_str("5. best_for_use_case: the use case key this platform fits best\n");
    prompt.push_str("6. overall_fit_score: number between 0.0 and 1.0\n");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> Ontology {
        Ontology::from_json(
            r#"{
                "capabilities": {
                    "delivery": {"label": "Delivery", "facets": ["api", "cdn"], "scale": "0-3", "importance": "critical"}
                },
                "use_cases": {
                    "marketing_site": {"label": "Marketing Site", "required_capabilities": {"delivery": 2}}
                },
                "business_outcomes": {}
            }"#,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_sections() {
        let prompt = build_prompt("Contentful", &ontology(), &OrganizationContext::default(), None);
        assert!(prompt.contains("Assess the 'Contentful' CMS platform"));
        assert!(prompt.contains("- delivery (Delivery): api, cdn [importance: critical]"));
        assert!(prompt.contains("- marketing_site (Marketing Site)"));
        assert!(prompt.contains("Use your knowledge of Contentful"));
        assert!(prompt.contains("CINCH REQUIREMENTS:"));
        assert!(prompt.contains("20K+ paid views/day"));
    }

    #[test]
    fn test_vendor_context_replaces_default() {
        let prompt = build_prompt(
            "Contentful",
            &ontology(),
            &OrganizationContext::default(),
            Some("Contentful ships a GraphQL delivery API."),
        );
        assert!(prompt.contains("GraphQL delivery API"));
        assert!(!prompt.contains("Use your knowledge"));
    }

    #[test]
    fn test_empty_requirements_skipped() {
        let org = OrganizationContext {
            name: "Acme".to_string(),
            requirements: Vec::new(),
        };
        let prompt = build_prompt("Sanity", &ontology(), &org, None);
        assert!(!prompt.contains("REQUIREMENTS:"));
        assert!(prompt.contains("exactly 3 key strengths for Acme"));
    }
}
