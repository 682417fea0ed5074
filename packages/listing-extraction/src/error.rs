//! Typed errors for the listing extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Marker the OpenAI API puts in the body of a quota-exhausted response.
pub const QUOTA_EXCEEDED_MARKER: &str = "insufficient_quota";

/// Errors that can occur while talking to the model or running a stage.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Account quota exhausted at the provider
    #[error("AI quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Provider asked us to slow down
    #[error("AI rate limited: {0}")]
    RateLimited(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Model answered with something that is not a listing payload
    #[error("invalid model response: {reason}")]
    InvalidResponse { reason: String },

    /// Stage input could not be used (missing file, not a JSON array)
    #[error("invalid input {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// Filesystem error while writing stage output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Results backend rejected a request
    #[error("results API error: {0}")]
    Api(#[from] ApiError),
}

impl ExtractionError {
    /// Whether this error signals an exhausted provider quota.
    ///
    /// Checks the dedicated variant first, then falls back to the marker
    /// string so errors wrapped by other providers are still recognised.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            Self::QuotaExceeded(_) => true,
            other => other.to_string().contains(QUOTA_EXCEEDED_MARKER),
        }
    }
}

/// A raw object that could not be coerced into a canonical listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// Input was not a JSON object
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// Required fields missing or unrecoverable after coercion
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingRequired { fields: Vec<&'static str> },
}

/// Errors returned by the results backend client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered with a status the endpoint does not accept
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Request never got an answer
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answer did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Base URL could not be joined with an endpoint path
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for record normalization.
pub type SchemaResult<T> = std::result::Result<T, SchemaViolation>;

/// Result type alias for results API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detected_from_variant() {
        let err = ExtractionError::QuotaExceeded("plan limit".into());
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn test_quota_detected_from_marker() {
        let err = ExtractionError::AI(
            r#"{"error":{"code":"insufficient_quota"}}"#.to_string().into(),
        );
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn test_plain_ai_error_is_not_quota() {
        let err = ExtractionError::AI("connection reset".into());
        assert!(!err.is_quota_exceeded());
    }

    #[test]
    fn test_missing_fields_message() {
        let violation = SchemaViolation::MissingRequired {
            fields: vec!["price", "image_link"],
        };
        assert_eq!(
            violation.to_string(),
            "missing required fields: price, image_link"
        );
    }
}
