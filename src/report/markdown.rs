//! Markdown layout

use super::{score_label, Report};

pub fn render(report: &Report) -> String {
    let mut lines = vec![
        format!("# {}", report.title),
        format!("**Generated:** {}", report.generated_label()),
        String::new(),
        "## Executive Summary".to_string(),
        report.summary.clone(),
        String::new(),
    ];

    if !report.use_cases.is_empty() {
        let labels: Vec<&str> = report.use_cases.iter().map(|u| u.label.as_str()).collect();
        lines.push(format!("**Selected use cases:** {}", labels.join(", ")));
        lines.push(String::new());
    }

    lines.push("## Platform Assessments".to_string());
    lines.push(String::new());

    for section in &report.platforms {
        let assessment = section.assessment();
        lines.push(format!("### {}", section.name));
        if let Some(meta) = section.metadata_line() {
            lines.push(format!("*{}*", meta));
            lines.push(String::new());
        }
        if let Some(platform) = &section.entry.platform {
            lines.push(platform.summary.clone());
            lines.push(String::new());
        }

        lines.push(format!("**Overall Fit:** {:.2}/1.0", assessment.overall_fit_score));
        if let Some(composite) = section.composite_line() {
            lines.push(String::new());
            lines.push(format!("**{}**", composite));
        }
        lines.push(String::new());

        lines.push("| Capability | Score |".to_string());
        lines.push("|---|---|".to_string());
        for row in &section.capabilities {
            lines.push(format!("| {} | {} |", cell(&row.label), cell(&score_label(row.score))));
        }
        lines.push(String::new());

        if !section.use_case_fits.is_empty() {
            lines.push("**Use-case fit:**".to_string());
            for row in &section.use_case_fits {
                lines.push(format!("- {}: {:.2}", row.label, row.fit));
            }
            lines.push(String::new());
        }

        lines.push("**Strengths:**".to_string());
        lines.extend(assessment.strengths.iter().map(|s| format!("- {}", s)));
        lines.push(String::new());
        lines.push("**Weaknesses:**".to_string());
        lines.extend(assessment.weaknesses.iter().map(|w| format!("- {}", w)));
        lines.push(String::new());
        lines.push(format!("**Best for:** {}", section.best_for.label));
        lines.push(format!("*Source: {}*", assessment.source.describe()));
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.push(String::new());
    if report.recommendations.is_empty() {
        lines.push("No architecture options selected.".to_string());
        lines.push(String::new());
    }
    for rec in &report.recommendations {
        let option = &rec.option;
        lines.push(format!("### {}: {}", rec.label, option.title));
        lines.push(format!("**Indicative fit:** {:.2}/1.0", option.fit_score));
        lines.push(String::new());
        lines.push(format!("**Stack:** {}", option.stack.join(", ")));
        lines.push(String::new());
        lines.push("**Pros:**".to_string());
        lines.extend(option.pros.iter().map(|p| format!("- {}", p)));
        lines.push(String::new());
        lines.push("**Cons:**".to_string());
        lines.extend(option.cons.iter().map(|c| format!("- {}", c)));
        lines.push(String::new());
        lines.push(format!("**Verdict:** {}", option.verdict));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Table cell text; a bare `|` would end the cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}
