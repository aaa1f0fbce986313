//! In-process [`ChatRepository`].
//!
//! Keeps chats and messages in memory with the same semantics as the chat
//! server: lazy chat creation, update-time touching, cascading chat delete
//! and newest-first paging. Each call runs under a single lock, so every
//! operation is all-or-nothing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, PoisonError};

use crate::error::PersistenceError;
use crate::models::{Chat, ChatPage, Message, DEFAULT_CHAT_TITLE};
use crate::traits::ChatRepository;

/// Chats per listing page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Default)]
struct Tables {
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

#[derive(Debug)]
pub struct InMemoryChatRepository {
    tables: Mutex<Tables>,
    page_size: usize,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            page_size: page_size.max(1),
        }
    }

    /// Seed a chat directly, bypassing lazy creation.
    pub fn insert_chat(&self, chat: Chat) {
        self.lock().chats.push(chat);
    }

    /// Stored messages of `chat_id`, in insertion order.
    pub fn messages_of(&self, chat_id: &str) -> Vec<Message> {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn chat(&self, chat_id: &str) -> Option<Chat> {
        self.lock().chats.iter().find(|c| c.id == chat_id).cloned()
    }

    pub fn chat_count(&self) -> usize {
        self.lock().chats.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save_message(&self, message: &Message) -> Result<Message, PersistenceError> {
        let mut tables = self.lock();
        let now = Utc::now();
        let mut saved = message.clone();

        // Resolve everything that can fail before mutating
        let slot = if saved.id.is_empty() {
            None
        } else {
            let index = tables
                .messages
                .iter()
                .position(|m| m.id == saved.id)
                .ok_or_else(|| PersistenceError::NotFound {
                    entity: "message",
                    id: saved.id.clone(),
                })?;
            Some(index)
        };

        if saved.chat_id.is_empty() {
            let chat = Chat::new(Self::new_id(), DEFAULT_CHAT_TITLE, now);
            tracing::info!(chat_id = %chat.id, "Chat created");
            saved.chat_id = chat.id.clone();
            tables.chats.push(chat);
        } else {
            let chat = tables
                .chats
                .iter_mut()
                .find(|c| c.id == saved.chat_id)
                .ok_or_else(|| PersistenceError::NotFound {
                    entity: "chat",
                    id: saved.chat_id.clone(),
                })?;
            chat.update_time = now;
        }

        match slot {
            Some(index) => tables.messages[index] = saved.clone(),
            None => {
                saved.id = Self::new_id();
                tables.messages.push(saved.clone());
            }
        }

        Ok(saved)
    }

    async fn delete_message(&self, id: &str) -> Result<(), PersistenceError> {
        let mut tables = self.lock();
        let index = tables
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| PersistenceError::NotFound {
                entity: "message",
                id: id.to_string(),
            })?;
        tables.messages.remove(index);
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<(), PersistenceError> {
        let mut tables = self.lock();
        let index = tables
            .chats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| PersistenceError::NotFound {
                entity: "chat",
                id: id.to_string(),
            })?;
        tables.messages.retain(|m| m.chat_id != id);
        tables.chats.remove(index);
        tracing::info!(chat_id = %id, "Chat deleted");
        Ok(())
    }

    async fn list_chats(&self, page: u32) -> Result<ChatPage, PersistenceError> {
        let tables = self.lock();
        let mut chats = tables.chats.clone();
        drop(tables);

        // Stable sort keeps insertion order among equal timestamps
        chats.sort_by(|a, b| b.update_time.cmp(&a.update_time));

        let skip = (page.max(1) as usize - 1) * self.page_size;
        let has_more = chats.len() > skip + self.page_size;
        let list = chats.into_iter().skip(skip).take(self.page_size).collect();

        Ok(ChatPage { list, has_more })
    }
}
