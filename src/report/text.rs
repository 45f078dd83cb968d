//! Plain-text layout for terminals

use super::{score_label, Report};
use std::fmt::Write;

const INDENT: &str = "   ";

pub fn render(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "{}", "=".repeat(report.title.chars().count()));
    let _ = writeln!(out, "Generated: {}", report.generated_label());
    out.push('\n');

    let _ = writeln!(out, "EXECUTIVE SUMMARY");
    let _ = writeln!(out, "{}", report.summary);
    if !report.use_cases.is_empty() {
        let labels: Vec<&str> = report.use_cases.iter().map(|u| u.label.as_str()).collect();
        let _ = writeln!(out, "Selected use cases: {}", labels.join(", "));
    }
    out.push('\n');

    let _ = writeln!(out, "PLATFORM ASSESSMENTS");
    for (i, section) in report.platforms.iter().enumerate() {
        let assessment = section.assessment();
        out.push('\n');
        let _ = writeln!(out, "{}. {}", i + 1, section.name);
        if let Some(meta) = section.metadata_line() {
            let _ = writeln!(out, "{}{}", INDENT, meta);
        }
        if let Some(platform) = &section.entry.platform {
            let _ = writeln!(out, "{}{}", INDENT, platform.summary);
        }
        let _ = writeln!(
            out,
            "{}Overall fit: {:.2}/1.0 ({})",
            INDENT,
            assessment.overall_fit_score,
            assessment.source.describe()
        );
        if let Some(composite) = section.composite_line() {
            let _ = writeln!(out, "{}{}", INDENT, composite);
        }

        if !section.use_case_fits.is_empty() {
            let _ = writeln!(out, "{}Use-case fit:", INDENT);
            for row in &section.use_case_fits {
                let _ = writeln!(out, "{}  - {}: {:.2}", INDENT, row.label, row.fit);
            }
        }

        let width = section
            .capabilities
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);
        let _ = writeln!(out, "{}Capability scores:", INDENT);
        for row in &section.capabilities {
            let _ = writeln!(
                out,
                "{}  {:<width$}  {}",
                INDENT,
                row.label,
                score_label(row.score),
                width = width
            );
        }

        let _ = writeln!(out, "{}Strengths:", INDENT);
        for s in &assessment.strengths {
            let _ = writeln!(out, "{}  + {}", INDENT, s);
        }
        let _ = writeln!(out, "{}Weaknesses:", INDENT);
        for w in &assessment.weaknesses {
            let _ = writeln!(out, "{}  - {}", INDENT, w);
        }
        let _ = writeln!(out, "{}Best for: {}", INDENT, section.best_for.label);
    }

    if !report.recommendations.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "RECOMMENDATIONS");
        for rec in &report.recommendations {
            let option = &rec.option;
            out.push('\n');
            let _ = writeln!(
                out,
                "{}: {} (indicative fit {:.2})",
                rec.label, option.title, option.fit_score
            );
            let _ = writeln!(out, "{}Stack: {}", INDENT, option.stack.join(", "));
            let _ = writeln!(out, "{}Pros: {}", INDENT, option.pros.join("; "));
            let _ = writeln!(out, "{}Cons: {}", INDENT, option.cons.join("; "));
            let _ = writeln!(out, "{}Verdict: {}", INDENT, option.verdict);
        }
    }

    out
}
