//! Evaluation reports
//!
//! [`ReportGenerator::build`] validates the entries and resolves every
//! label into a [`Report`]; the format modules only lay it out.

pub mod docx;
pub mod json;
pub mod markdown;
pub mod text;

use crate::assessment::PlatformAssessment;
use crate::catalog::{ArchitectureCatalog, ArchitectureOption, Platform};
use crate::error::{EvalError, Result};
use crate::metrics::METRICS;
use crate::ontology::{Ontology, MAX_LEVEL};
use crate::scoring::ScoreCard;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    Text,
    #[default]
    Markdown,
    Json,
    Docx,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Json => "json",
            ReportFormat::Docx => "docx",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
            ReportFormat::Docx => "docx",
        }
    }

    /// Binary formats must go to a file
    pub fn is_binary(&self) -> bool {
        matches!(self, ReportFormat::Docx)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            "docx" | "word" => Ok(ReportFormat::Docx),
            other => Err(EvalError::unknown("report format", other)),
        }
    }
}

/// One platform's material for a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub assessment: PlatformAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_card: Option<ScoreCard>,
}

impl ReportEntry {
    pub fn new(assessment: PlatformAssessment) -> Self {
        Self {
            assessment,
            platform: None,
            score_card: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_score_card(mut self, score_card: ScoreCard) -> Self {
        self.score_card = Some(score_card);
        self
    }

    fn validate(&self, position: usize) -> Result<()> {
        let a = &self.assessment;
        if a.platform.trim().is_empty() {
            return Err(EvalError::Format(format!("entry {} has no platform name", position + 1)));
        }
        let name = a.platform.as_str();

        let missing = |field: &str| {
            EvalError::Format(format!("entry for '{}' is missing {}", name, field))
        };
        if a.capability_scores.is_empty() {
            return Err(missing("capability scores"));
        }
        if a.strengths.iter().all(|s| s.trim().is_empty()) {
            return Err(missing("strengths"));
        }
        if a.weaknesses.iter().all(|s| s.trim().is_empty()) {
            return Err(missing("weaknesses"));
        }
        if a.best_for_use_case.trim().is_empty() {
            return Err(missing("a best-fit use case"));
        }
        if !a.overall_fit_score.is_finite() || !(0.0..=1.0).contains(&a.overall_fit_score) {
            return Err(EvalError::Format(format!(
                "entry for '{}' has overall fit {} outside [0, 1]",
                name, a.overall_fit_score
            )));
        }
        Ok(())
    }
}

/// Use case identifier with its display label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseCaseRef {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityRow {
    pub key: String,
    pub label: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UseCaseFitRow {
    pub key: String,
    pub label: String,
    pub fit: f64,
}

/// A validated entry with labels resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSection {
    pub name: String,
    #[serde(flatten)]
    pub entry: ReportEntry,
    pub capabilities: Vec<CapabilityRow>,
    pub use_case_fits: Vec<UseCaseFitRow>,
    pub best_for: UseCaseRef,
}

impl PlatformSection {
    pub fn assessment(&self) -> &PlatformAssessment {
        &self.entry.assessment
    }

    /// One-line platform metadata, if the entry carries any
    pub fn metadata_line(&self) -> Option<String> {
        let platform = self.entry.platform.as_ref()?;
        let mut parts = vec![
            format!("Type: {}", platform.platform_type),
            format!("Category: {}", platform.category),
            format!("Deployment: {}", platform.deployment),
            format!("Cost: {}", platform.cost_band),
        ];
        if let Some(traffic) = &platform.traffic_band {
            parts.push(format!("Traffic: {}", traffic));
        }
        Some(parts.join(" | "))
    }

    /// `Composite 0.80 (use-case fit 0.90, business fit 0.67)`
    pub fn composite_line(&self) -> Option<String> {
        self.entry.score_card.as_ref().map(|card| {
            format!(
                "Composite {:.2} (use-case fit {:.2}, business fit {:.2})",
                card.composite, card.use_case_fit, card.business_fit
            )
        })
    }
}

/// An architecture option attached to a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    #[serde(flatten)]
    pub option: ArchitectureOption,
}

/// Fully resolved report document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub use_cases: Vec<UseCaseRef>,
    pub platforms: Vec<PlatformSection>,
    pub recommendations: Vec<Recommendation>,
}

impl Report {
    pub fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    pub fn render(&self, format: ReportFormat) -> Result<Vec<u8>> {
        match format {
            ReportFormat::Text => Ok(text::render(self).into_bytes()),
            ReportFormat::Markdown => Ok(markdown::render(self).into_bytes()),
            ReportFormat::Json => json::render(self).map(String::into_bytes),
            ReportFormat::Docx => docx::render(self),
        }
    }
}

/// Score shown as `2/3`
pub(crate) fn score_label(score: u8) -> String {
    format!("{}/{}", score, MAX_LEVEL)
}

/// Builds reports against one ontology
pub struct ReportGenerator<'a> {
    title: String,
    ontology: &'a Ontology,
    architectures: Option<&'a ArchitectureCatalog>,
    generated_at: Option<DateTime<Utc>>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(title: impl Into<String>, ontology: &'a Ontology) -> Self {
        Self {
            title: title.into(),
            ontology,
            architectures: None,
            generated_at: None,
        }
    }

    pub fn with_architectures(mut self, architectures: &'a ArchitectureCatalog) -> Self {
        self.architectures = Some(architectures);
        self
    }

    /// Pin the generation timestamp instead of using the current time
    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Validate `entries`, resolve labels and assemble the report.
    /// Entries keep the order given.
    pub fn build(
        &self,
        entries: Vec<ReportEntry>,
        use_cases: &[String],
        recommendations: &[String],
    ) -> Result<Report> {
        for (position, entry) in entries.iter().enumerate() {
            entry.validate(position)?;
        }

        let use_cases = use_cases
            .iter()
            .map(|key| {
                let use_case = self.ontology.use_case(key)?;
                Ok(UseCaseRef {
                    key: key.clone(),
                    label: use_case.label.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let recommendations = self.resolve_recommendations(recommendations)?;
        let summary = self.summary(&entries);
        let platforms = entries.into_iter().map(|e| self.section(e)).collect();

        Ok(Report {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            summary,
            use_cases,
            platforms,
            recommendations,
        })
    }

    /// Build and render in one step
    pub fn generate(
        &self,
        entries: Vec<ReportEntry>,
        use_cases: &[String],
        recommendations: &[String],
        format: ReportFormat,
    ) -> Result<Vec<u8>> {
        let report = self.build(entries, use_cases, recommendations)?;
        let bytes = report.render(format)?;
        METRICS.record_report(format.as_str());
        info!(
            report_id = %report.id,
            "Generated {} report: {} platform(s), {} recommendation(s), {} bytes",
            format,
            report.platforms.len(),
            report.recommendations.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn resolve_recommendations(&self, labels: &[String]) -> Result<Vec<Recommendation>> {
        if labels.is_empty() {
            return Ok(Vec::new());
        }
        let catalog = self.architectures.ok_or_else(|| {
            EvalError::Format("recommendations requested but no architecture options loaded".to_string())
        })?;
        labels
            .iter()
            .map(|label| {
                catalog
                    .get(label)
                    .map(|option| Recommendation {
                        label: label.clone(),
                        option: option.clone(),
                    })
                    .ok_or_else(|| {
                        EvalError::Format(format!("unknown recommendation label '{}'", label))
                    })
            })
            .collect()
    }

    fn summary(&self, entries: &[ReportEntry]) -> String {
        let mut summary = format!(
            "Evaluation of {} CMS platform(s) against business and technical requirements.",
            entries.len()
        );
        // First entry wins ties
        let leader = entries.iter().max_by(|a, b| {
            a.assessment
                .overall_fit_score
                .total_cmp(&b.assessment.overall_fit_score)
                .then(std::cmp::Ordering::Greater)
        });
        if let Some(leader) = leader {
            summary.push_str(&format!(
                " Highest overall fit: {} ({:.2}/1.0).",
                leader.assessment.platform, leader.assessment.overall_fit_score
            ));
        }
        if entries.iter().any(|e| e.assessment.is_ai_generated()) {
            summary.push_str(" Includes AI-generated assessments; verify against vendor documentation.");
        }
        summary
    }

    fn section(&self, entry: ReportEntry) -> PlatformSection {
        let capabilities = entry
            .assessment
            .capability_scores
            .iter()
            .map(|(key, score)| CapabilityRow {
                key: key.clone(),
                label: self.capability_label(key),
                score: *score,
            })
            .collect();

        let use_case_fits = entry
            .score_card
            .as_ref()
            .map(|card| {
                card.use_case_fits
                    .iter()
                    .map(|(key, fit)| UseCaseFitRow {
                        key: key.clone(),
                        label: self.use_case_label(key),
                        fit: *fit,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let best_key = entry.assessment.best_for_use_case.clone();
        PlatformSection {
            name: entry.assessment.platform.clone(),
            best_for: UseCaseRef {
                label: self.use_case_label(&best_key),
                key: best_key,
            },
            capabilities,
            use_case_fits,
            entry,
        }
    }

    fn capability_label(&self, key: &str) -> String {
        self.ontology
            .capability(key)
            .map(|c| c.label.clone())
            .unwrap_or_else(|_| key.to_string())
    }

    fn use_case_label(&self, key: &str) -> String {
        self.ontology
            .use_case(key)
            .map(|u| u.label.clone())
            .unwrap_or_else(|_| key.to_string())
    }
}
