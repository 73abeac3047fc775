//! Request Validator
//!
//! Cheapest rejection path: runs before language resolution and before any
//! upstream call. Checks are ordered and short-circuit on the first failure:
//! 1. `code` present and a non-empty string
//! 2. `language` present and a non-empty string
//! 3. `code` no larger than the byte limit

use crate::types::{ExecutionRequest, IncomingRequest};
use serde_json::Value;
use thiserror::Error;

/// Default upper bound on source size, in bytes
pub const MAX_CODE_BYTES: usize = 50_000;

/// Why a request was turned away before dispatch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Code is required and must be a non-empty string")]
    MissingOrInvalidCode,

    #[error("Language is required and must be a non-empty string")]
    MissingOrInvalidLanguage,

    #[error("Code exceeds maximum size of {limit} bytes (got {actual} bytes)")]
    CodeTooLarge { limit: usize, actual: usize },

    #[error("Unsupported language '{language}'. Supported languages: {}", .supported.join(", "))]
    UnsupportedLanguage {
        language: String,
        supported: Vec<String>,
    },
}

impl Rejection {
    /// Stable label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MalformedBody(_) => "malformed_body",
            Rejection::InvalidBody(_) => "invalid_body",
            Rejection::MissingOrInvalidCode => "missing_or_invalid_code",
            Rejection::MissingOrInvalidLanguage => "missing_or_invalid_language",
            Rejection::CodeTooLarge { .. } => "code_too_large",
            Rejection::UnsupportedLanguage { .. } => "unsupported_language",
        }
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Validate a raw request, producing a typed [`ExecutionRequest`]
pub fn validate(raw: IncomingRequest, max_code_bytes: usize) -> Result<ExecutionRequest, Rejection> {
    let source_code = non_empty_string(raw.code).ok_or(Rejection::MissingOrInvalidCode)?;
    let language_id = non_empty_string(raw.language).ok_or(Rejection::MissingOrInvalidLanguage)?;

    if source_code.len() > max_code_bytes {
        return Err(Rejection::CodeTooLarge {
            limit: max_code_bytes,
            actual: source_code.len(),
        });
    }

    Ok(ExecutionRequest {
        source_code,
        language_id,
        stdin: raw.stdin.unwrap_or_default(),
        requested_version: raw.version.filter(|v| !v.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn incoming(code: Value, language: Value) -> IncomingRequest {
        IncomingRequest {
            code: Some(code),
            language: Some(language),
            stdin: None,
            version: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let raw = IncomingRequest {
            code: Some(json!("print(42)")),
            language: Some(json!("python")),
            stdin: Some("in".to_string()),
            version: Some("3.12.0".to_string()),
        };

        let req = validate(raw, MAX_CODE_BYTES).unwrap();
        assert_eq!(req.source_code, "print(42)");
        assert_eq!(req.language_id, "python");
        assert_eq!(req.stdin, "in");
        assert_eq!(req.requested_version.as_deref(), Some("3.12.0"));
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let req = validate(incoming(json!("x"), json!("go")), MAX_CODE_BYTES).unwrap();
        assert_eq!(req.stdin, "");
        assert_eq!(req.requested_version, None);
    }

    #[test]
    fn test_blank_version_is_ignored() {
        let mut raw = incoming(json!("x"), json!("go"));
        raw.version = Some("  ".to_string());
        let req = validate(raw, MAX_CODE_BYTES).unwrap();
        assert_eq!(req.requested_version, None);
    }

    #[test]
    fn test_missing_code() {
        let raw = IncomingRequest {
            language: Some(json!("python")),
            ..Default::default()
        };
        assert_eq!(validate(raw, MAX_CODE_BYTES), Err(Rejection::MissingOrInvalidCode));
    }

    #[test]
    fn test_non_textual_code() {
        for code in [json!(42), json!(null), json!(["a"]), json!({"a": 1}), json!("")] {
            assert_eq!(
                validate(incoming(code, json!("python")), MAX_CODE_BYTES),
                Err(Rejection::MissingOrInvalidCode)
            );
        }
    }

    #[test]
    fn test_missing_or_invalid_language() {
        assert_eq!(
            validate(incoming(json!("x"), json!(7)), MAX_CODE_BYTES),
            Err(Rejection::MissingOrInvalidLanguage)
        );

        let raw = IncomingRequest {
            code: Some(json!("x")),
            ..Default::default()
        };
        assert_eq!(validate(raw, MAX_CODE_BYTES), Err(Rejection::MissingOrInvalidLanguage));
    }

    #[test]
    fn test_code_checked_before_language() {
        assert_eq!(
            validate(IncomingRequest::default(), MAX_CODE_BYTES),
            Err(Rejection::MissingOrInvalidCode)
        );
    }

    #[test]
    fn test_size_limit_is_in_bytes() {
        let at_limit = "a".repeat(MAX_CODE_BYTES);
        assert!(validate(incoming(json!(at_limit), json!("python")), MAX_CODE_BYTES).is_ok());

        // 25,001 two-byte characters: under the limit in chars, over it in bytes
        let multibyte = "é".repeat(25_001);
        let err = validate(incoming(json!(multibyte), json!("python")), MAX_CODE_BYTES).unwrap_err();
        assert_eq!(
            err,
            Rejection::CodeTooLarge {
                limit: MAX_CODE_BYTES,
                actual: 50_002
            }
        );
        assert!(err.to_string().contains("50000"));
    }

    #[test]
    fn test_size_checked_after_language() {
        let big = "a".repeat(MAX_CODE_BYTES + 1);
        assert_eq!(
            validate(incoming(json!(big), json!(1)), MAX_CODE_BYTES),
            Err(Rejection::MissingOrInvalidLanguage)
        );
    }

    #[test]
    fn test_body_rejections_are_distinct() {
        let syntax = Rejection::MalformedBody("EOF while parsing".to_string());
        let data = Rejection::InvalidBody("stdin: invalid type: integer".to_string());

        assert!(syntax.to_string().contains("not valid JSON"));
        assert!(!data.to_string().contains("not valid JSON"));
        assert_ne!(syntax.reason(), data.reason());
    }

    #[test]
    fn test_unsupported_language_message_lists_all_ids() {
        let rejection = Rejection::UnsupportedLanguage {
            language: "cobol".to_string(),
            supported: vec!["python".to_string(), "go".to_string()],
        };
        let message = rejection.to_string();
        assert!(message.contains("cobol"));
        assert!(message.contains("python, go"));
        assert_eq!(rejection.reason(), "unsupported_language");
    }
}
