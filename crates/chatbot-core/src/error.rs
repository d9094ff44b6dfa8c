//! Error classification for chat requests

use serde_json::{json, Value};
use thiserror::Error;

/// Everything that can stop a chat request from producing a reply.
///
/// Each variant knows its HTTP status and response body so runtimes only
/// have to serialize it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    // 400-level: Client errors
    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("message is required")]
    MissingMessage,

    #[error("message is {length} characters, limit is {limit}")]
    MessageTooLong { length: usize, limit: usize },

    #[error("invalid value for '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    // 500-level: Model and server errors
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("model returned an unexpected response: {0}")]
    MalformedModelResponse(String),

    #[error("{code}: {message}")]
    ModelAccess { code: String, message: String },

    #[error("{0}")]
    Internal(String),
}

impl ChatError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidJson
            | Self::MissingMessage
            | Self::MessageTooLong { .. }
            | Self::InvalidParameter { .. } => 400,
            Self::UnsupportedModel(_)
            | Self::MalformedModelResponse(_)
            | Self::ModelAccess { .. }
            | Self::Internal(_) => 500,
        }
    }

    /// Value of the `status` field in the response body
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::ModelAccess { .. } => "aws_error",
            Self::UnsupportedModel(_) | Self::MalformedModelResponse(_) | Self::Internal(_) => {
                "internal_error"
            }
            _ => "error",
        }
    }

    /// Human-readable message shown to the caller
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidJson => "Invalid JSON body.".to_string(),
            Self::MissingMessage => "A message is required.".to_string(),
            Self::MessageTooLong { limit, .. } => format!(
                "Message is too long. Keep it within {} characters.",
                group_thousands(*limit)
            ),
            Self::InvalidParameter { field, reason } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
            Self::ModelAccess { code, message } => match code.as_str() {
                "AccessDeniedException" => {
                    "Model access is denied. Enable model access in the Bedrock console."
                        .to_string()
                }
                "ThrottlingException" => {
                    "Too many requests. Please try again shortly.".to_string()
                }
                "ValidationException" => format!("Invalid model request: {}", message),
                _ => format!("AWS service error: {}", message),
            },
            Self::UnsupportedModel(_) | Self::MalformedModelResponse(_) => {
                format!("Model invocation failed: {}", self)
            }
            Self::Internal(message) => format!("Internal server error: {}", message),
        }
    }

    /// JSON response body for this error
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "error": self.user_message(),
            "status": self.status_label(),
        });

        match self {
            Self::MissingMessage => {
                body["required_fields"] = json!(["message"]);
                body["optional_fields"] =
                    json!(["session_id", "model_id", "max_tokens", "temperature"]);
            }
            Self::MessageTooLong { length, limit } => {
                body["current_length"] = json!(length);
                body["max_length"] = json!(limit);
            }
            Self::ModelAccess { code, .. } => {
                body["error_code"] = json!(code);
            }
            _ => {}
        }

        body
    }
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
