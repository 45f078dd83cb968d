//! Reading and writing the JSON data documents (ontology, catalog, architectures)

use crate::error::{EvalError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Parse a document from text. `origin` names the source in error messages.
pub fn parse_document<T: DeserializeOwned>(text: &str, origin: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| EvalError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Read and parse a document from disk
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: origin.clone(),
        source,
    })?;
    debug!("Read {} bytes from {}", text.len(), origin);
    parse_document(&text, &origin)
}

/// Serialize a document the way the data files are laid out (2-space pretty JSON)
pub fn to_document_string<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| EvalError::Format(format!("Failed to serialize document: {}", e)))
}
