//! Streaming conversation engine.
//!
//! Orchestrates send, resend and stop for one client session: persists the
//! user message, opens a completion stream over the full history, folds the
//! received text into the [`Store`] and writes the final reply back.
//!
//! The engine is the only place that coordinates the three views of a
//! conversation: the optimistic in-memory state, the persisted record and
//! the partially received stream.

mod decode;
mod phase;
mod stop;

pub use decode::Utf8Accumulator;
pub use phase::Phase;
pub use stop::StopSignal;

use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::bus::{EventBus, Topic};
use crate::error::{ChatResult, PersistenceError, TransportError, ValidationError};
use crate::models::{Chat, CompletionRequest, Message};
use crate::state::{Action, StateField, Store};
use crate::traits::{ChatRepository, CompletionProvider, ReplyStream};

/// Result of a finished send or resend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    /// Id of the assistant reply
    pub message_id: String,
    /// Final reply text as persisted
    pub content: String,
    /// Whether the reply was cut short by a stop or a conversation switch
    pub cancelled: bool,
}

/// Operation-scoped state that does not belong in the reducer.
#[derive(Debug, Default)]
struct SessionContext {
    /// Conversation id once known, empty for a brand-new conversation
    chat_id: String,
    input: String,
    phase: Phase,
    /// Bumped on every conversation switch
    epoch: u64,
}

/// How a read loop ended.
enum ReadEnd {
    Completed,
    Stopped,
    Failed(TransportError),
}

/// Claim on the engine for one send or resend.
///
/// Dropping it returns the engine to `Idle` and releases the streaming slot
/// if the reply still holds it, whether the operation finished or its
/// future was dropped part way.
struct Operation<'a> {
    engine: &'a StreamingEngine,
    epoch: u64,
    /// Sees every conversation switch made after the claim
    switched: watch::Receiver<u64>,
    /// Placeholder id once the reply owns the streaming slot
    reply_id: Option<String>,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.reply_id.take() {
            let released = self.engine.store.dispatch_if(
                |s| s.streaming_id == id,
                Action::Set(StateField::StreamingId(String::new())),
            );
            if released {
                tracing::debug!(id = %id, "Released streaming slot of an unfinished reply");
            }
        }
        self.engine.set_phase(Phase::Idle);
    }
}

pub struct StreamingEngine {
    store: Store,
    bus: EventBus,
    repository: Arc<dyn ChatRepository>,
    completions: Arc<dyn CompletionProvider>,
    session: Mutex<SessionContext>,
    stop: StopSignal,
    /// Carries the session epoch to running operations
    switches: watch::Sender<u64>,
}

impl StreamingEngine {
    pub fn new(
        store: Store,
        bus: EventBus,
        repository: Arc<dyn ChatRepository>,
        completions: Arc<dyn CompletionProvider>,
    ) -> Self {
        let chat_id = store.read(|s| s.selected_chat_id().to_string());
        Self {
            store,
            bus,
            repository,
            completions,
            session: Mutex::new(SessionContext {
                chat_id,
                ..SessionContext::default()
            }),
            stop: StopSignal::new(),
            switches: watch::channel(0).0,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn phase(&self) -> Phase {
        self.session().phase
    }

    /// Id of the open conversation, empty until the first message is saved.
    pub fn conversation_id(&self) -> String {
        self.session().chat_id.clone()
    }

    pub fn input(&self) -> String {
        self.session().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.session().input = text.into();
    }

    fn session(&self) -> MutexGuard<'_, SessionContext> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: Phase) {
        let mut session = self.session();
        if session.phase != next {
            tracing::debug!(from = %session.phase, to = %next, "Engine phase");
            session.phase = next;
        }
    }

    /// Claim the engine for one operation.
    fn begin(&self, entry: Phase) -> Result<Operation<'_>, ValidationError> {
        let mut session = self.session();
        if !session.phase.is_idle() || !self.store.streaming_id().is_empty() {
            return Err(ValidationError::StreamActive);
        }
        tracing::debug!(from = %session.phase, to = %entry, "Engine phase");
        session.phase = entry;
        Ok(Operation {
            engine: self,
            epoch: session.epoch,
            switched: self.switches.subscribe(),
            reply_id: None,
        })
    }

    fn switched_since(&self, epoch: u64) -> bool {
        self.session().epoch != epoch
    }

    /// Record the conversation id returned by persistence.
    ///
    /// Announces the conversation the first time its id becomes known.
    fn adopt_chat_id(&self, chat_id: &str, epoch: u64) {
        let first = {
            let mut session = self.session();
            if session.epoch != epoch || !session.chat_id.is_empty() || chat_id.is_empty() {
                false
            } else {
                session.chat_id = chat_id.to_string();
                true
            }
        };

        if first {
            tracing::info!(chat_id = %chat_id, "Conversation created");
            self.bus.publish(
                Topic::ConversationListChanged,
                Some(&json!({ "chatId": chat_id })),
            );
        }
    }

    /// Send `text` as a new user message and stream the reply.
    pub async fn send(&self, text: &str) -> ChatResult<SendOutcome> {
        if text.trim().is_empty() {
            return Err(ValidationError::BlankMessage.into());
        }
        let mut op = self.begin(Phase::PersistingUserMessage)?;
        self.send_user_message(text, &mut op).await
    }

    async fn send_user_message(&self, text: &str, op: &mut Operation<'_>) -> ChatResult<SendOutcome> {
        let draft = Message::user(text, self.conversation_id());
        let saved = self.repository.save_message(&draft).await.map_err(|e| {
            tracing::warn!(error = %e, "Saving user message failed");
            e
        })?;
        self.adopt_chat_id(&saved.chat_id, op.epoch);

        if self.switched_since(op.epoch) {
            return Ok(SendOutcome::abandoned());
        }
        let chat_id = saved.chat_id.clone();
        self.store.dispatch(Action::AddMessage(saved));

        self.do_send(self.store.messages(), chat_id, op).await
    }

    /// Regenerate the last reply.
    ///
    /// A trailing assistant message is deleted from persistence and then
    /// from the view before the history is sent again. If the delete fails
    /// nothing changes.
    pub async fn resend(&self) -> ChatResult<SendOutcome> {
        let mut op = self.begin(Phase::AwaitingStreamOpen)?;
        self.resend_last(&mut op).await
    }

    async fn resend_last(&self, op: &mut Operation<'_>) -> ChatResult<SendOutcome> {
        let messages = self.store.messages();
        let Some(last) = messages.last() else {
            return Err(ValidationError::NothingToResend.into());
        };

        if last.is_assistant() {
            if last.is_persisted() {
                self.repository.delete_message(&last.id).await.map_err(|e| {
                    tracing::warn!(error = %e, id = %last.id, "Deleting reply for resend failed");
                    e
                })?;
            }
            self.store.dispatch(Action::RemoveMessage(last.clone()));
        }

        if self.switched_since(op.epoch) {
            return Ok(SendOutcome::abandoned());
        }

        let chat_id = {
            let session = self.session();
            if session.chat_id.is_empty() {
                last.chat_id.clone()
            } else {
                session.chat_id.clone()
            }
        };
        self.do_send(self.store.messages(), chat_id, op).await
    }

    async fn do_send(
        &self,
        history: Vec<Message>,
        chat_id: String,
        op: &mut Operation<'_>,
    ) -> ChatResult<SendOutcome> {
        self.session().input.clear();
        self.set_phase(Phase::AwaitingStreamOpen);

        let request = CompletionRequest::new(history, self.store.current_model());
        let opened = tokio::select! {
            opened = self.completions.open(&request) => opened,
            _ = op.switched.changed() => {
                tracing::debug!("Conversation switched while opening the reply stream");
                return Ok(SendOutcome::abandoned());
            }
        };
        let mut stream = opened.map_err(|e| {
            tracing::warn!(error = %e, "Opening completion stream failed");
            e
        })?;

        let placeholder = match self
            .repository
            .save_message(&Message::assistant_placeholder(chat_id))
            .await
        {
            Ok(placeholder) => placeholder,
            Err(e) => {
                tracing::warn!(error = %e, "Saving reply placeholder failed");
                stream.abort();
                return Err(e.into());
            }
        };

        if self.switched_since(op.epoch) {
            stream.abort();
            return Ok(SendOutcome::abandoned());
        }

        self.stop.clear();
        op.reply_id = Some(placeholder.id.clone());
        self.store.dispatch(Action::AddMessage(placeholder.clone()));
        self.store
            .dispatch(Action::Set(StateField::StreamingId(placeholder.id.clone())));
        self.set_phase(Phase::Streaming);

        let mut text = Utf8Accumulator::new();
        let end = self
            .read_reply(stream.as_mut(), &placeholder, &mut text, &mut op.switched)
            .await;

        self.set_phase(Phase::Finalizing);
        let content = text.text().to_string();
        let written = self.finalize(&placeholder, &content).await;
        let cancelled = matches!(end, ReadEnd::Stopped);

        match end {
            ReadEnd::Failed(err) => {
                if let Err(e) = written {
                    tracing::warn!(error = %e, "Writing back partial reply failed");
                }
                Err(err.into())
            }
            ReadEnd::Completed | ReadEnd::Stopped => {
                written?;
                tracing::info!(
                    id = %placeholder.id,
                    chars = content.chars().count(),
                    cancelled,
                    "Reply finished"
                );
                Ok(SendOutcome {
                    message_id: placeholder.id,
                    content,
                    cancelled,
                })
            }
        }
    }

    /// Fold chunks into the target message until end of data, a read
    /// failure, an acknowledged stop or a conversation switch.
    ///
    /// A stop is honored between chunks. A switch also interrupts a wait
    /// for the next chunk.
    async fn read_reply(
        &self,
        stream: &mut dyn ReplyStream,
        target: &Message,
        text: &mut Utf8Accumulator,
        switched: &mut watch::Receiver<u64>,
    ) -> ReadEnd {
        let mut chunks = 0usize;

        loop {
            let next = tokio::select! {
                next = stream.next_chunk() => next,
                _ = switched.changed() => {
                    tracing::debug!(chunks, "Conversation switched while reading");
                    self.set_phase(Phase::Cancelled);
                    stream.abort();
                    return ReadEnd::Stopped;
                }
            };

            match next {
                None => {
                    if text.finish() {
                        self.publish_content(target, text.text());
                    }
                    tracing::debug!(chunks, "Reply stream ended");
                    return ReadEnd::Completed;
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, chunks, "Reply stream failed");
                    stream.abort();
                    return ReadEnd::Failed(err);
                }
                Some(Ok(bytes)) => {
                    chunks += 1;
                    if text.push(&bytes) {
                        self.publish_content(target, text.text());
                    }
                }
            }

            if self.stop.take() {
                tracing::debug!(chunks, "Stop acknowledged");
                self.set_phase(Phase::Cancelled);
                stream.abort();
                return ReadEnd::Stopped;
            }
        }
    }

    fn publish_content(&self, target: &Message, content: &str) {
        self.store
            .dispatch(Action::UpdateMessage(target.with_content(content)));
    }

    /// Persist the final content, then release the streaming slot if this
    /// reply still holds it.
    async fn finalize(&self, target: &Message, content: &str) -> Result<Message, PersistenceError> {
        let written = self.repository.save_message(&target.with_content(content)).await;
        let id = target.id.clone();
        self.store.dispatch_if(
            move |s| s.streaming_id == id,
            Action::Set(StateField::StreamingId(String::new())),
        );
        written
    }

    /// Ask the running reply to stop at its next chunk boundary.
    pub fn stop(&self) -> ChatResult<()> {
        if self.store.streaming_id().is_empty() {
            return Err(ValidationError::NotStreaming.into());
        }
        tracing::debug!("Stop requested");
        self.stop.request();
        Ok(())
    }

    /// Switch the view to `chat` (or a fresh conversation) with `messages`.
    ///
    /// A running reply is asked to stop; its late updates no longer match
    /// anything in the view.
    pub fn open_chat(&self, chat: Option<Chat>, messages: Vec<Message>) {
        if !self.store.streaming_id().is_empty() {
            self.stop.request();
        }

        {
            let mut session = self.session();
            session.chat_id = chat.as_ref().map(|c| c.id.clone()).unwrap_or_default();
            session.epoch += 1;
            let epoch = session.epoch;
            self.switches.send_replace(epoch);
        }

        self.store.dispatch_batch(vec![
            Action::Set(StateField::StreamingId(String::new())),
            Action::Set(StateField::SelectedChat(chat)),
            Action::Set(StateField::MessageList(messages)),
        ]);
    }

    pub fn new_chat(&self) {
        self.open_chat(None, Vec::new());
    }

    /// Delete a conversation and all of its messages.
    pub async fn delete_chat(&self, chat_id: &str) -> ChatResult<()> {
        self.repository.delete_chat(chat_id).await.map_err(|e| {
            tracing::warn!(error = %e, chat_id = %chat_id, "Deleting chat failed");
            e
        })?;

        let is_open = self.conversation_id() == chat_id
            || self.store.read(|s| s.selected_chat_id() == chat_id);
        if is_open {
            self.new_chat();
        }

        self.bus.publish(
            Topic::ConversationListChanged,
            Some(&json!({ "chatId": chat_id, "deleted": true })),
        );
        Ok(())
    }

    pub fn select_model(&self, model: impl Into<String>) {
        self.store
            .dispatch(Action::Set(StateField::CurrentModel(model.into())));
    }

    pub fn toggle_theme(&self) {
        let next = self.store.read(|s| s.theme_mode.toggled());
        self.store.dispatch(Action::Set(StateField::ThemeMode(next)));
    }

    pub fn set_navigation_visible(&self, visible: bool) {
        self.store
            .dispatch(Action::Set(StateField::DisplayNavigation(visible)));
    }
}

impl SendOutcome {
    /// The conversation was switched away while the operation ran.
    fn abandoned() -> Self {
        Self {
            message_id: String::new(),
            content: String::new(),
            cancelled: true,
        }
    }
}

impl std::fmt::Debug for StreamingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingEngine")
            .field("session", &*self.session())
            .field("stop", &self.stop)
            .finish()
    }
}
