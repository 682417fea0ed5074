//! Parsing model responses into candidate listing objects.
//!
//! Models answer with bare JSON or wrap it in a Markdown code fence. Either
//! way the result is a list of JSON values to hand to the schema.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::{ExtractionError, Result};

lazy_static! {
    static ref FENCED_BLOCK: Regex = Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)\s*```").unwrap();
}

/// Strip the first code fence, if any, and return the JSON payload text.
pub fn json_payload(response: &str) -> &str {
    FENCED_BLOCK
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim()
}

/// Parse a response into candidate objects.
///
/// An array is returned as-is, a single object becomes a one-element list.
/// Anything else is an invalid response.
pub fn parse_candidates(response: &str) -> Result<Vec<Value>> {
    let payload = json_payload(response);
    if payload.is_empty() {
        return Err(ExtractionError::InvalidResponse {
            reason: "empty response".into(),
        });
    }

    match serde_json::from_str::<Value>(payload)? {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        other => Err(ExtractionError::InvalidResponse {
            reason: format!("expected a JSON array or object, got {other}"),
        }),
    }
}

/// Whether a cleaning response is the "discard this record" signal.
pub fn is_discard(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block() {
        let response = "Here you go:\n```json\n[{\"price\": 1}]\n```\nAnything else?";
        assert_eq!(parse_candidates(response).unwrap(), vec![json!({"price": 1})]);
    }

    #[test]
    fn test_unlabelled_fence() {
        let response = "```\n{\"price\": 2}\n```";
        assert_eq!(parse_candidates(response).unwrap(), vec![json!({"price": 2})]);
    }

    #[test]
    fn test_bare_object_becomes_single_item() {
        assert_eq!(
            parse_candidates(" {\"a\": true} ").unwrap(),
            vec![json!({"a": true})]
        );
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = parse_candidates("```json\n[{\"price\": }]\n```").unwrap_err();
        assert!(matches!(err, ExtractionError::JsonParse(_)));
    }

    #[test]
    fn test_scalar_is_invalid() {
        let err = parse_candidates("42").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidResponse { .. }));
    }

    #[test]
    fn test_discard_signal() {
        assert!(is_discard(&json!({})));
        assert!(!is_discard(&json!({"price": 1})));
        assert!(!is_discard(&json!([])));
    }
}
