// In-memory fakes for handler tests

use anyhow::{bail, Result};
use async_trait::async_trait;
use chatbot_core::{ChatError, ChatMessage, Conversation};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{ConversationStore, ModelInvoker};

/// Answers every call with a fixed Anthropic-style reply or error
#[derive(Clone)]
pub(crate) struct FakeModel {
    reply: Result<String, ChatError>,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl FakeModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            last_request: Arc::default(),
        }
    }

    pub fn failing(err: ChatError) -> Self {
        Self {
            reply: Err(err),
            last_request: Arc::default(),
        }
    }

    pub fn last_request(&self) -> Option<Value> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for FakeModel {
    async fn invoke(&self, _model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, ChatError> {
        *self.last_request.lock().unwrap() = serde_json::from_slice(&body).ok();
        let text = self.reply.clone()?;
        Ok(json!({"content": [{"type": "text", "text": text}]})
            .to_string()
            .into_bytes())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    conversations: Mutex<HashMap<String, Conversation>>,
    broken: bool,
}

impl MemoryStore {
    /// Every load and save fails
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, session_id: &str, messages: Vec<ChatMessage>) {
        let conversation = Conversation::new(session_id, messages, usize::MAX, 0, 0);
        self.conversations
            .lock()
            .unwrap()
            .insert(session_id.to_string(), conversation);
    }

    pub fn get(&self, session_id: &str) -> Option<Conversation> {
        self.conversations.lock().unwrap().get(session_id).cloned()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        if self.broken {
            bail!("table unavailable");
        }
        Ok(self
            .get(session_id)
            .map(|c| c.messages)
            .unwrap_or_default())
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        if self.broken {
            bail!("table unavailable");
        }
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.session_id.clone(), conversation.clone());
        Ok(())
    }
}
