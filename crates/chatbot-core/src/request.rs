//! Chat request parsing and validation

use serde_json::{Map, Value};

use crate::ChatError;

/// Values used when the request body leaves a field out; the runtime
/// builds these from its configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_message_chars: usize,
}

/// A validated chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    /// Parse a POST body.
    ///
    /// The message is trimmed before validation. Numeric fields accept both
    /// JSON numbers and numeric strings.
    pub fn from_json(body: &str, defaults: &RequestDefaults) -> Result<Self, ChatError> {
        let body = if body.trim().is_empty() { "{}" } else { body };
        let value: Value = serde_json::from_str(body).map_err(|_| ChatError::InvalidJson)?;
        let fields = match value {
            Value::Object(fields) => fields,
            _ => return Err(ChatError::InvalidJson),
        };

        let message = match fields.get("message") {
            Some(Value::String(text)) => text.trim().to_string(),
            Some(Value::Null) | None => String::new(),
            Some(_) => {
                return Err(ChatError::InvalidParameter {
                    field: "message",
                    reason: "expected a string".to_string(),
                })
            }
        };

        if message.is_empty() {
            return Err(ChatError::MissingMessage);
        }

        let length = message.chars().count();
        if length > defaults.max_message_chars {
            return Err(ChatError::MessageTooLong {
                length,
                limit: defaults.max_message_chars,
            });
        }

        let session_id = match fields.get("session_id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        let model_id = match fields.get("model_id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => defaults.model_id.clone(),
        };

        let max_tokens = match number_field(&fields, "max_tokens")? {
            Some(value) if value.fract() == 0.0 && value >= 1.0 && value <= u32::MAX as f64 => {
                value as u32
            }
            Some(value) => {
                return Err(ChatError::InvalidParameter {
                    field: "max_tokens",
                    reason: format!("expected a positive integer, got {}", value),
                })
            }
            None => defaults.max_tokens,
        };

        let temperature = match number_field(&fields, "temperature")? {
            Some(value) if (0.0..=1.0).contains(&value) => value as f32,
            Some(value) => {
                return Err(ChatError::InvalidParameter {
                    field: "temperature",
                    reason: format!("expected a value between 0 and 1, got {}", value),
                })
            }
            None => defaults.temperature,
        };

        Ok(Self {
            message,
            session_id,
            model_id,
            max_tokens,
            temperature,
        })
    }
}

fn number_field(fields: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, ChatError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(ChatError::InvalidParameter {
            field,
            reason: "number out of range".to_string(),
        }),
        Some(Value::String(s)) => {
            s.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ChatError::InvalidParameter {
                    field,
                    reason: format!("'{}' is not a number", s),
                })
        }
        Some(_) => Err(ChatError::InvalidParameter {
            field,
            reason: "expected a number".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> RequestDefaults {
        RequestDefaults {
            model_id: "anthropic.claude-sonnet-4-20250514-v1:0".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            max_message_chars: 10_000,
        }
    }

    fn parse(body: &str) -> Result<ChatRequest, ChatError> {
        ChatRequest::from_json(body, &defaults())
    }

    #[test]
    fn minimal_request_uses_defaults() {
        let request = parse(r#"{"message": "  Hello there  "}"#).unwrap();
        assert_eq!(request.message, "Hello there");
        assert_eq!(request.session_id, None);
        assert_eq!(request.model_id, "anthropic.claude-sonnet-4-20250514-v1:0");
        assert_eq!(request.max_tokens, 1000);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let request = parse(
            r#"{"message": "hi", "session_id": "abc", "model_id": "amazon.titan-text-express-v1",
                "max_tokens": "256", "temperature": 0.2}"#,
        )
        .unwrap();
        assert_eq!(request.session_id.as_deref(), Some("abc"));
        assert_eq!(request.model_id, "amazon.titan-text-express-v1");
        assert_eq!(request.max_tokens, 256);
        assert!((request.temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_eq!(parse("{not json"), Err(ChatError::InvalidJson));
        assert_eq!(parse("[1, 2]"), Err(ChatError::InvalidJson));
    }

    #[test]
    fn empty_or_whitespace_message_is_missing() {
        assert_eq!(parse(""), Err(ChatError::MissingMessage));
        assert_eq!(parse("{}"), Err(ChatError::MissingMessage));
        assert_eq!(parse(r#"{"message": "   \n"}"#), Err(ChatError::MissingMessage));
    }

    #[test]
    fn message_length_limit_is_inclusive() {
        let at_limit = format!(r#"{{"message": "{}"}}"#, "a".repeat(10_000));
        assert!(parse(&at_limit).is_ok());

        let over_limit = format!(r#"{{"message": "{}"}}"#, "a".repeat(10_001));
        assert_eq!(
            parse(&over_limit),
            Err(ChatError::MessageTooLong {
                length: 10_001,
                limit: 10_000
            })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Each Hangul syllable is three bytes in UTF-8
        let body = format!(r#"{{"message": "{}"}}"#, "안".repeat(10_000));
        assert!(parse(&body).is_ok());
    }

    #[test]
    fn bad_numeric_fields_are_rejected() {
        assert!(matches!(
            parse(r#"{"message": "hi", "max_tokens": "lots"}"#),
            Err(ChatError::InvalidParameter { field: "max_tokens", .. })
        ));
        assert!(matches!(
            parse(r#"{"message": "hi", "max_tokens": 0}"#),
            Err(ChatError::InvalidParameter { field: "max_tokens", .. })
        ));
        assert!(matches!(
            parse(r#"{"message": "hi", "temperature": 1.5}"#),
            Err(ChatError::InvalidParameter { field: "temperature", .. })
        ));
    }

    #[test]
    fn empty_session_id_means_no_session() {
        let request = parse(r#"{"message": "hi", "session_id": ""}"#).unwrap();
        assert_eq!(request.session_id, None);
    }
}
