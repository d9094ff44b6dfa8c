//! Chat messages and per-session conversation records

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Stored conversation for one session.
///
/// `updated_at` and `ttl` are Unix seconds; the store expires records once
/// `ttl` has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: i64,
    pub ttl: i64,
}

impl Conversation {
    /// Build a record from the full history, keeping only the most recent
    /// `limit` messages.
    pub fn new(
        session_id: impl Into<String>,
        messages: Vec<ChatMessage>,
        limit: usize,
        now: i64,
        ttl_secs: u64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            messages: trim_history(messages, limit),
            updated_at: now,
            ttl: now.saturating_add(ttl_secs as i64),
        }
    }
}

/// Keep the last `limit` messages
pub fn trim_history(mut messages: Vec<ChatMessage>, limit: usize) -> Vec<ChatMessage> {
    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }
    messages
}
