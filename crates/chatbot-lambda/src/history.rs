// Conversation history in DynamoDB
//
// One item per session:
//   session_id (S, partition key), messages (L of M{role, content}),
//   updated_at (N), ttl (N, epoch seconds for DynamoDB TTL)

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chatbot_core::{ChatMessage, Conversation, Role};
use std::collections::HashMap;
use tracing::{debug, warn};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stored messages for a session, oldest first; empty when none exist
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    async fn save(&self, conversation: &Conversation) -> Result<()>;
}

pub struct DynamoDbStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(config),
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl ConversationStore for DynamoDbStore {
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("session_id", AttributeValue::S(session_id.to_string()))
            .send()
            .await
            .with_context(|| format!("GetItem on {} failed", self.table_name))?;

        let messages = output.item().map(messages_from_item).unwrap_or_default();
        debug!(session_id, count = messages.len(), "Loaded conversation history");
        Ok(messages)
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(conversation_to_item(conversation)))
            .send()
            .await
            .with_context(|| format!("PutItem on {} failed", self.table_name))?;

        debug!(
            session_id = %conversation.session_id,
            count = conversation.messages.len(),
            "Saved conversation history"
        );
        Ok(())
    }
}

pub(crate) fn conversation_to_item(conversation: &Conversation) -> HashMap<String, AttributeValue> {
    let messages = conversation
        .messages
        .iter()
        .map(|message| {
            AttributeValue::M(HashMap::from([
                (
                    "role".to_string(),
                    AttributeValue::S(message.role.as_str().to_string()),
                ),
                (
                    "content".to_string(),
                    AttributeValue::S(message.content.clone()),
                ),
            ]))
        })
        .collect();

    HashMap::from([
        (
            "session_id".to_string(),
            AttributeValue::S(conversation.session_id.clone()),
        ),
        ("messages".to_string(), AttributeValue::L(messages)),
        (
            "updated_at".to_string(),
            AttributeValue::N(conversation.updated_at.to_string()),
        ),
        (
            "ttl".to_string(),
            AttributeValue::N(conversation.ttl.to_string()),
        ),
    ])
}

/// Malformed entries are skipped rather than failing the request
pub(crate) fn messages_from_item(item: &HashMap<String, AttributeValue>) -> Vec<ChatMessage> {
    let Some(Ok(entries)) = item.get("messages").map(AttributeValue::as_l) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let fields = entry.as_m().ok()?;
            let role = fields.get("role")?.as_s().ok()?;
            let content = fields.get("content")?.as_s().ok()?;
            match role.parse::<Role>() {
                Ok(role) => Some(ChatMessage {
                    role,
                    content: content.clone(),
                }),
                Err(_) => {
                    warn!(role = %role, "Skipping stored message with unknown role");
                    None
                }
            }
        })
        .collect()
}
