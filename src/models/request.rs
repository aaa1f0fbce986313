use serde::{Deserialize, Serialize};

use super::Message;

/// Body of a streaming completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    /// Full ordered history, oldest first
    pub messages: Vec<Message>,
    /// Model identifier
    pub model: String,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
        }
    }
}

/// `{ "code": 0, "data": ... }` wrapper used by every backend route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Payload of a successful message upsert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedMessage {
    pub message: Message,
}
