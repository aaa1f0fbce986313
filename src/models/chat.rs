use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string};

/// Title given to a chat created lazily by its first message
pub const DEFAULT_CHAT_TITLE: &str = "New conversation";

/// A conversation summary as listed by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub title: String,
    /// Last time a message of this chat was written
    #[serde(default = "Utc::now")]
    pub update_time: DateTime<Utc>,
}

impl Chat {
    pub fn new(id: impl Into<String>, title: impl Into<String>, update_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            update_time,
        }
    }
}

/// One page of the chat listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    #[serde(default)]
    pub list: Vec<Chat>,
    #[serde(default)]
    pub has_more: bool,
}
