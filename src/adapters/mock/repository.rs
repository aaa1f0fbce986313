//! Recording chat repository for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::adapters::InMemoryChatRepository;
use crate::error::PersistenceError;
use crate::models::{ChatPage, Message};
use crate::traits::ChatRepository;

/// A repository call as seen by [`RecordingRepository`].
#[derive(Debug, Clone, PartialEq)]
pub enum RepoCall {
    Save(Message),
    DeleteMessage(String),
    DeleteChat(String),
    ListChats(u32),
}

/// Operation names accepted by [`RecordingRepository::fail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoOp {
    Save,
    DeleteMessage,
    DeleteChat,
    ListChats,
}

impl RepoOp {
    fn name(&self) -> &'static str {
        match self {
            RepoOp::Save => "save_message",
            RepoOp::DeleteMessage => "delete_message",
            RepoOp::DeleteChat => "delete_chat",
            RepoOp::ListChats => "list_chats",
        }
    }
}

/// Wraps an [`InMemoryChatRepository`], records every call and can be told
/// to fail or hold specific operations.
#[derive(Debug, Clone)]
pub struct RecordingRepository {
    inner: Arc<InMemoryChatRepository>,
    calls: Arc<Mutex<Vec<RepoCall>>>,
    failing: Arc<Mutex<HashSet<RepoOp>>>,
    list_gate: Arc<Mutex<Option<Arc<Notify>>>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::wrap(InMemoryChatRepository::new())
    }

    pub fn wrap(inner: InMemoryChatRepository) -> Self {
        Self {
            inner: Arc::new(inner),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            list_gate: Arc::new(Mutex::new(None)),
            journal: None,
        }
    }

    /// Also append a line per call to a journal shared with other observers.
    pub fn with_journal(mut self, journal: Arc<Mutex<Vec<String>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn store(&self) -> &InMemoryChatRepository {
        &self.inner
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: RepoOp) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    (op, call),
                    (RepoOp::Save, RepoCall::Save(_))
                        | (RepoOp::DeleteMessage, RepoCall::DeleteMessage(_))
                        | (RepoOp::DeleteChat, RepoCall::DeleteChat(_))
                        | (RepoOp::ListChats, RepoCall::ListChats(_))
                )
            })
            .count()
    }

    /// Make `op` fail with [`PersistenceError::Rejected`] until cleared.
    pub fn fail(&self, op: RepoOp) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn succeed(&self, op: RepoOp) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// Make `list_chats` wait for a notification before answering.
    pub fn hold_list_chats(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_list_chats(&self) {
        if let Some(gate) = self.list_gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    fn record(&self, call: RepoCall) {
        if let Some(journal) = &self.journal {
            let line = match &call {
                RepoCall::Save(m) => format!("save {} '{}'", m.role.as_str(), m.content),
                RepoCall::DeleteMessage(id) => format!("delete_message {}", id),
                RepoCall::DeleteChat(id) => format!("delete_chat {}", id),
                RepoCall::ListChats(page) => format!("list_chats {}", page),
            };
            journal.lock().unwrap().push(line);
        }
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: RepoOp) -> Result<(), PersistenceError> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(PersistenceError::Rejected {
                operation: op.name(),
                code: 1,
            });
        }
        Ok(())
    }
}

impl Default for RecordingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for RecordingRepository {
    async fn save_message(&self, message: &Message) -> Result<Message, PersistenceError> {
        self.record(RepoCall::Save(message.clone()));
        self.check(RepoOp::Save)?;
        self.inner.save_message(message).await
    }

    async fn delete_message(&self, id: &str) -> Result<(), PersistenceError> {
        self.record(RepoCall::DeleteMessage(id.to_string()));
        self.check(RepoOp::DeleteMessage)?;
        self.inner.delete_message(id).await
    }

    async fn delete_chat(&self, id: &str) -> Result<(), PersistenceError> {
        self.record(RepoCall::DeleteChat(id.to_string()));
        self.check(RepoOp::DeleteChat)?;
        self.inner.delete_chat(id).await
    }

    async fn list_chats(&self, page: u32) -> Result<ChatPage, PersistenceError> {
        self.record(RepoCall::ListChats(page));
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(RepoOp::ListChats)?;
        self.inner.list_chats(page).await
    }
}
