//! State transitions.

use crate::models::{Chat, Message};

use super::app_state::{AppState, ThemeMode};

/// A replacement value for one top-level [`AppState`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum StateField {
    CurrentModel(String),
    ThemeMode(ThemeMode),
    DisplayNavigation(bool),
    SelectedChat(Option<Chat>),
    StreamingId(String),
    MessageList(Vec<Message>),
}

impl StateField {
    pub fn name(&self) -> &'static str {
        match self {
            StateField::CurrentModel(_) => "currentModel",
            StateField::ThemeMode(_) => "themeMode",
            StateField::DisplayNavigation(_) => "displayNavigation",
            StateField::SelectedChat(_) => "selectedChat",
            StateField::StreamingId(_) => "streamingId",
            StateField::MessageList(_) => "messageList",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set(StateField),
    /// Append unless a message with the same id is already listed.
    AddMessage(Message),
    /// Replace the message with the same id; content is the full text.
    UpdateMessage(Message),
    RemoveMessage(Message),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Set(_) => "Set",
            Action::AddMessage(_) => "AddMessage",
            Action::UpdateMessage(_) => "UpdateMessage",
            Action::RemoveMessage(_) => "RemoveMessage",
        }
    }
}

/// Pure transition. Unknown ids make Update and Remove no-ops.
pub fn apply(mut state: AppState, action: &Action) -> AppState {
    match action {
        Action::Set(field) => match field {
            StateField::CurrentModel(model) => state.current_model = model.clone(),
            StateField::ThemeMode(mode) => state.theme_mode = *mode,
            StateField::DisplayNavigation(shown) => state.display_navigation = *shown,
            StateField::SelectedChat(chat) => state.selected_chat = chat.clone(),
            StateField::StreamingId(id) => state.streaming_id = id.clone(),
            StateField::MessageList(list) => state.message_list = list.clone(),
        },
        Action::AddMessage(message) => {
            if !state.message_list.iter().any(|m| m.id == message.id) {
                state.message_list.push(message.clone());
            }
        }
        Action::UpdateMessage(message) => {
            if let Some(slot) = state.message_list.iter_mut().find(|m| m.id == message.id) {
                *slot = message.clone();
            }
        }
        Action::RemoveMessage(message) => {
            state.message_list.retain(|m| m.id != message.id);
        }
    }
    state
}
