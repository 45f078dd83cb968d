//! Error types shared across the evaluator

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, EvalError>;

/// Evaluation errors
///
/// Remote failures (`RemoteService`, `Timeout`, `SchemaViolation`) and
/// `RateLimit` come from the LLM round trip; everything else is local.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown {kind} '{key}'")]
    UnknownIdentifier { kind: &'static str, key: String },

    #[error("Platform '{platform}' has no score for capability '{capability}'")]
    MissingScore { platform: String, capability: String },

    #[error("Remote service error ({provider}): {message}")]
    RemoteService { provider: String, message: String },

    #[error("Remote service timed out ({provider}): {message}")]
    Timeout { provider: String, message: String },

    #[error("Rate limited by {provider}: {message}")]
    RateLimit { provider: String, message: String },

    #[error("Schema violation in assessment for '{platform}': {message}")]
    SchemaViolation { platform: String, message: String },

    #[error("Report format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EvalError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EvalError::InvalidInput(msg.into())
    }

    pub fn unknown(kind: &'static str, key: impl Into<String>) -> Self {
        EvalError::UnknownIdentifier {
            kind,
            key: key.into(),
        }
    }

    /// True for failures of the LLM round trip
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            EvalError::RemoteService { .. }
                | EvalError::Timeout { .. }
                | EvalError::RateLimit { .. }
                | EvalError::SchemaViolation { .. }
        )
    }

    /// Whether a caller-side retry policy may try again.
    /// Schema violations are retried too: a second sample often parses.
    pub fn is_retryable(&self) -> bool {
        self.is_remote()
    }

    /// Bad identifiers and malformed data documents
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            EvalError::InvalidInput(_)
                | EvalError::UnknownIdentifier { .. }
                | EvalError::MissingScore { .. }
        )
    }
}
