use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
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

/// A single message of a conversation.
///
/// `id` is empty until the persistence layer has stored the message. The
/// same type is used for the in-memory view, the wire and the durable record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Backend identifier (empty while unpersisted)
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Full text content
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub content: String,
    /// Owning chat (empty requests lazy chat creation)
    #[serde(default, deserialize_with = "deserialize_id")]
    pub chat_id: String,
}

impl Message {
    /// Create an unpersisted message.
    pub fn new(role: Role, content: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            role,
            content: content.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Create an unpersisted user message.
    pub fn user(content: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self::new(Role::User, content, chat_id)
    }

    /// Create an empty, unpersisted assistant reply bound to `chat_id`.
    pub fn assistant_placeholder(chat_id: impl Into<String>) -> Self {
        Self::new(Role::Assistant, String::new(), chat_id)
    }

    /// Whether the persistence layer has assigned an id.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Copy of this message carrying `content`.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }
}
