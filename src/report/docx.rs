//! Word (OOXML) layout
//!
//! A `.docx` file is a zip archive of XML parts. Only the parts Word needs
//! to open the document are written: content types, package relationships,
//! the main document and a small style sheet for the headings.

use super::{score_label, Report};
use crate::error::{EvalError, Result};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="48"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360"/></w:pPr></w:style>
</w:styles>"#;

/// Escape text for XML content and attribute values
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are invalid in XML 1.0
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Accumulates `<w:p>` paragraphs for `word/document.xml`
#[derive(Default)]
struct Body {
    xml: String,
}

impl Body {
    fn paragraph(&mut self, style: Option<&str>, text: &str) {
        self.xml.push_str("<w:p>");
        if let Some(style) = style {
            self.xml.push_str(&format!("<w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>", style));
        }
        self.xml.push_str(&format!(
            "<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape(text)
        ));
    }

    fn title(&mut self, text: &str) {
        self.paragraph(Some("Title"), text);
    }

    fn heading(&mut self, level: u8, text: &str) {
        self.paragraph(Some(&format!("Heading{}", level)), text);
    }

    fn text(&mut self, text: &str) {
        self.paragraph(None, text);
    }

    fn bullet(&mut self, text: &str) {
        self.paragraph(Some("ListBullet"), &format!("\u{2022} {}", text));
    }

    fn into_document(self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body>{}<w:sectPr/></w:body></w:document>"
            ),
            self.xml
        )
    }
}

fn document_xml(report: &Report) -> String {
    let mut body = Body::default();

    body.title(&report.title);
    body.text(&format!("Generated: {}", report.generated_label()));

    body.heading(1, "Executive Summary");
    body.text(&report.summary);
    if !report.use_cases.is_empty() {
        let labels: Vec<&str> = report.use_cases.iter().map(|u| u.label.as_str()).collect();
        body.text(&format!("Selected use cases: {}", labels.join(", ")));
    }

    body.heading(1, "Platform Assessments");
    for section in &report.platforms {
        let assessment = section.assessment();
        body.heading(2, &section.name);
        if let Some(meta) = section.metadata_line() {
            body.text(&meta);
        }
        if let Some(platform) = &section.entry.platform {
            body.text(&platform.summary);
        }
        body.text(&format!("Overall Fit: {:.2}/1.0", assessment.overall_fit_score));
        if let Some(composite) = section.composite_line() {
            body.text(&composite);
        }

        if !section.use_case_fits.is_empty() {
            body.text("Use-case fit:");
            for row in &section.use_case_fits {
                body.bullet(&format!("{}: {:.2}", row.label, row.fit));
            }
        }

        body.text("Capability scores:");
        for row in &section.capabilities {
            body.bullet(&format!("{}: {}", row.label, score_label(row.score)));
        }

        body.text("Strengths:");
        for s in &assessment.strengths {
            body.bullet(s);
        }
        body.text("Weaknesses:");
        for w in &assessment.weaknesses {
            body.bullet(w);
        }
        body.text(&format!("Best for: {}", section.best_for.label));
        body.text(&format!("Source: {}", assessment.source.describe()));
    }

    body.heading(1, "Recommendations");
    for rec in &report.recommendations {
        let option = &rec.option;
        body.heading(2, &format!("{}: {}", rec.label, option.title));
        body.text(&format!("Indicative fit: {:.2}/1.0", option.fit_score));
        body.text(&format!("Stack: {}", option.stack.join(", ")));
        body.text("Pros:");
        for p in &option.pros {
            body.bullet(p);
        }
        body.text("Cons:");
        for c in &option.cons {
            body.bullet(c);
        }
        body.text(&format!("Verdict: {}", option.verdict));
    }

    body.into_document()
}

pub fn render(report: &Report) -> Result<Vec<u8>> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/styles.xml", STYLES.to_string()),
        ("word/document.xml", document_xml(report)),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in &parts {
        zip.start_file(*name, options)
            .map_err(|e| EvalError::Format(format!("Failed to add {}: {}", name, e)))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| EvalError::Format(format!("Failed to write {}: {}", name, e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| EvalError::Format(format!("Failed to finish document: {}", e)))?;
    Ok(cursor.into_inner())
}
