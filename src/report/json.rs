//! JSON layout

use super::Report;
use crate::document::to_document_string;
use crate::error::Result;

pub fn render(report: &Report) -> Result<String> {
    to_document_string(report)
}
