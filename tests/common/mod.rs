//! Common test utilities for integration tests.
//!
//! ```ignore
//! let session = TestSessionBuilder::new().with_reply(MockReply::text(&["Hi"])).build();
//! session.engine.send("hello").await?;
//! ```

pub mod mocks;

pub use mocks::*;

use std::sync::{Arc, Mutex};

use chatline::adapters::mock::{MockCompletionProvider, MockReply, RecordingRepository};
use chatline::adapters::InMemoryChatRepository;
use chatline::bus::EventBus;
use chatline::engine::StreamingEngine;
use chatline::models::Chat;
use chatline::state::{AppState, Store};

/// A fully wired engine over in-memory collaborators.
pub struct TestSession {
    pub engine: Arc<StreamingEngine>,
    pub store: Store,
    pub bus: EventBus,
    pub repo: RecordingRepository,
    pub provider: MockCompletionProvider,
    /// Store actions and repository calls, interleaved in occurrence order
    pub journal: Arc<Mutex<Vec<String>>>,
}

impl TestSession {
    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }
}

/// Builder for [`TestSession`] scenarios.
#[derive(Default)]
pub struct TestSessionBuilder {
    replies: Vec<MockReply>,
    chats: Vec<Chat>,
    page_size: Option<usize>,
    model: Option<String>,
}

impl TestSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next opened stream.
    pub fn with_reply(mut self, reply: MockReply) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn with_chat(mut self, chat: Chat) -> Self {
        self.chats.push(chat);
        self
    }

    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn build(self) -> TestSession {
        let journal = Arc::new(Mutex::new(Vec::new()));

        let backing = match self.page_size {
            Some(size) => InMemoryChatRepository::with_page_size(size),
            None => InMemoryChatRepository::new(),
        };
        for chat in self.chats {
            backing.insert_chat(chat);
        }
        let repo = RecordingRepository::wrap(backing).with_journal(Arc::clone(&journal));

        let provider = MockCompletionProvider::new();
        for reply in self.replies {
            provider.push_reply(reply);
        }

        let state = match self.model {
            Some(model) => AppState::with_model(model),
            None => AppState::default(),
        };
        let store = Store::new(state);
        journal_actions(&store, Arc::clone(&journal));

        let bus = EventBus::new();
        let engine = Arc::new(StreamingEngine::new(
            store.clone(),
            bus.clone(),
            Arc::new(repo.clone()),
            Arc::new(provider.clone()),
        ));

        TestSession {
            engine,
            store,
            bus,
            repo,
            provider,
            journal,
        }
    }
}
