//! Persistence collaborator seam.

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::models::{ChatPage, Message};

/// Durable store of chats and messages.
///
/// The in-memory conversation view is reconciled with this store only
/// through explicit calls; nothing here pushes changes back to the client.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Create (empty id) or update (non-empty id) a message.
    ///
    /// A message without a chat id gets a freshly created chat, titled
    /// [`crate::models::DEFAULT_CHAT_TITLE`], whose id is written into the
    /// returned message. Otherwise the owning chat's update time is touched.
    async fn save_message(&self, message: &Message) -> Result<Message, PersistenceError>;

    async fn delete_message(&self, id: &str) -> Result<(), PersistenceError>;

    /// Delete a chat together with all of its messages, all or nothing.
    async fn delete_chat(&self, id: &str) -> Result<(), PersistenceError>;

    /// One page (1-based) of chats, most recently updated first.
    async fn list_chats(&self, page: u32) -> Result<ChatPage, PersistenceError>;
}
