use serde::{Deserialize, Serialize};

use crate::models::{Chat, Message};

/// Model used until the user or the configuration picks another one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// The global view of one client session.
///
/// `streaming_id` is empty while idle. When set it names an assistant
/// message in `message_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub current_model: String,
    pub message_list: Vec<Message>,
    pub streaming_id: String,
    pub selected_chat: Option<Chat>,
    pub theme_mode: ThemeMode,
    pub display_navigation: bool,
}

impl AppState {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            current_model: model.into(),
            ..Self::default()
        }
    }

    pub fn is_streaming(&self) -> bool {
        !self.streaming_id.is_empty()
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.message_list.iter().find(|m| m.id == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.message_list.last()
    }

    /// Id of the open chat, empty for a conversation not yet persisted.
    pub fn selected_chat_id(&self) -> &str {
        self.selected_chat.as_ref().map(|c| c.id.as_str()).unwrap_or("")
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_model: DEFAULT_MODEL.to_string(),
            message_list: Vec::new(),
            streaming_id: String::new(),
            selected_chat: None,
            theme_mode: ThemeMode::Light,
            display_navigation: true,
        }
    }
}
