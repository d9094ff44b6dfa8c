//! Bedrock model request and response formats
//!
//! Two model families are supported:
//! - Anthropic Claude (messages API)
//! - Amazon Titan Text (single prompt string)

use serde_json::{json, Value};

use crate::{ChatError, ChatMessage, Role};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const TITAN_TOP_P: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Anthropic,
    Titan,
}

impl ModelFamily {
    /// Detect the family from a Bedrock model id
    pub fn detect(model_id: &str) -> Result<Self, ChatError> {
        if model_id.contains("anthropic") {
            Ok(ModelFamily::Anthropic)
        } else if model_id.contains("amazon.titan") {
            Ok(ModelFamily::Titan)
        } else {
            Err(ChatError::UnsupportedModel(model_id.to_string()))
        }
    }

    /// Request body for `InvokeModel`
    pub fn request_body(&self, messages: &[ChatMessage], max_tokens: u32, temperature: f32) -> Value {
        match self {
            ModelFamily::Anthropic => json!({
                "anthropic_version": ANTHROPIC_VERSION,
                "max_tokens": max_tokens,
                "messages": messages,
                "temperature": temperature,
            }),
            ModelFamily::Titan => json!({
                "inputText": titan_prompt(messages),
                "textGenerationConfig": {
                    "maxTokenCount": max_tokens,
                    "temperature": temperature,
                    "topP": TITAN_TOP_P,
                },
            }),
        }
    }

    /// Pull the generated text out of an `InvokeModel` response body
    pub fn extract_text(&self, body: &[u8]) -> Result<String, ChatError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ChatError::MalformedModelResponse(e.to_string()))?;

        let text = match self {
            ModelFamily::Anthropic => value.pointer("/content/0/text"),
            ModelFamily::Titan => value.pointer("/results/0/outputText"),
        };

        text.and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ChatError::MalformedModelResponse(format!(
                    "no generated text in {:?} response",
                    self
                ))
            })
    }
}

/// Flatten a conversation into Titan's prompt format
pub fn titan_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let speaker = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant: ");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_families() {
        assert_eq!(
            ModelFamily::detect("anthropic.claude-sonnet-4-20250514-v1:0").unwrap(),
            ModelFamily::Anthropic
        );
        assert_eq!(
            ModelFamily::detect("apac.anthropic.claude-3-haiku-20240307-v1:0").unwrap(),
            ModelFamily::Anthropic
        );
        assert_eq!(
            ModelFamily::detect("amazon.titan-text-express-v1").unwrap(),
            ModelFamily::Titan
        );
        assert_eq!(
            ModelFamily::detect("meta.llama3-8b-instruct-v1:0"),
            Err(ChatError::UnsupportedModel(
                "meta.llama3-8b-instruct-v1:0".to_string()
            ))
        );
    }

    #[test]
    fn anthropic_body_carries_messages() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ModelFamily::Anthropic.request_body(&messages, 512, 0.5);
        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn titan_body_uses_prompt() {
        let messages = vec![
            ChatMessage::user("What is Rust?"),
            ChatMessage::assistant("A language."),
            ChatMessage::user("Is it fast?"),
        ];
        let body = ModelFamily::Titan.request_body(&messages, 300, 0.7);
        assert_eq!(
            body["inputText"],
            "User: What is Rust?\nAssistant: A language.\nUser: Is it fast?\nAssistant: "
        );
        assert_eq!(body["textGenerationConfig"]["maxTokenCount"], 300);
        assert!(body["textGenerationConfig"]["topP"].as_f64().unwrap() > 0.89);
    }

    #[test]
    fn extracts_anthropic_text() {
        let body = br#"{"content": [{"type": "text", "text": "Hello!"}], "stop_reason": "end_turn"}"#;
        assert_eq!(
            ModelFamily::Anthropic.extract_text(body).unwrap(),
            "Hello!"
        );
    }

    #[test]
    fn extracts_titan_text() {
        let body = br#"{"inputTextTokenCount": 3, "results": [{"outputText": " Sure."}]}"#;
        assert_eq!(ModelFamily::Titan.extract_text(body).unwrap(), " Sure.");
    }

    #[test]
    fn missing_text_is_malformed() {
        let err = ModelFamily::Anthropic
            .extract_text(br#"{"content": []}"#)
            .unwrap_err();
        assert!(matches!(err, ChatError::MalformedModelResponse(_)));

        let err = ModelFamily::Titan.extract_text(b"not json").unwrap_err();
        assert!(matches!(err, ChatError::MalformedModelResponse(_)));
    }

    #[test]
    fn empty_history_prompt_still_asks_assistant() {
        assert_eq!(titan_prompt(&[]), "Assistant: ");
    }
}
