// Humaniser Data Models
// Request/response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============ Validation ============

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("text must be a string")]
    NotAString,
    #[error("text is empty")]
    Empty,
}

// ============ Humanise Request ============

/// Body of `POST /api/humanise`. Either `text` or `input` carries the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HumaniseRequest {
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
}

impl HumaniseRequest {
    /// Pick the text to humanise.
    ///
    /// An absent or falsy `text` (null, "", 0, false, empty array/object) falls
    /// through to `input`. The chosen value must be a string that is not blank.
    pub fn requested_text(&self) -> Result<String, ValidationError> {
        let picked = [self.text.as_ref(), self.input.as_ref()]
            .into_iter()
            .flatten()
            .find(|v| !is_falsy(v));

        match picked {
            None => Err(ValidationError::Empty),
            Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::Empty),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ValidationError::NotAString),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

// ============ Responses ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumaniseResponse {
    pub original: String,
    pub humanised: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req(value: Value) -> HumaniseRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_field() {
        assert_eq!(req(json!({"text": "hi"})).requested_text(), Ok("hi".to_string()));
    }

    #[test]
    fn test_input_field_fallback() {
        assert_eq!(req(json!({"input": "hey"})).requested_text(), Ok("hey".to_string()));
        assert_eq!(
            req(json!({"text": "", "input": "hey"})).requested_text(),
            Ok("hey".to_string())
        );
        assert_eq!(
            req(json!({"text": null, "input": "hey"})).requested_text(),
            Ok("hey".to_string())
        );
    }

    #[test]
    fn test_missing_and_blank() {
        assert_eq!(req(json!({})).requested_text(), Err(ValidationError::Empty));
        assert_eq!(req(json!({"text": "   "})).requested_text(), Err(ValidationError::Empty));
        assert_eq!(req(json!({"text": 0})).requested_text(), Err(ValidationError::Empty));
    }

    #[test]
    fn test_non_string() {
        assert_eq!(req(json!({"text": 42})).requested_text(), Err(ValidationError::NotAString));
        assert_eq!(
            req(json!({"input": ["a"]})).requested_text(),
            Err(ValidationError::NotAString)
        );
    }

    #[test]
    fn test_original_text_kept_verbatim() {
        assert_eq!(
            req(json!({"text": "  spaced  "})).requested_text(),
            Ok("  spaced  ".to_string())
        );
    }
}
