//! Scripted completion provider for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::models::CompletionRequest;
use crate::traits::{CompletionProvider, ReplyStream};

/// How the next opened stream behaves.
#[derive(Debug)]
pub enum MockReply {
    /// Yield the chunks, then end
    Chunks(Vec<Bytes>),
    /// Yield the chunks, then fail with the error
    ChunksThenError(Vec<Bytes>, TransportError),
    /// Refuse to open
    OpenError(TransportError),
    /// Yield whatever the paired [`ReplyFeeder`] sends, end when it is dropped
    Fed(mpsc::UnboundedReceiver<Result<Bytes, TransportError>>),
}

impl MockReply {
    pub fn text(parts: &[&str]) -> Self {
        MockReply::Chunks(parts.iter().map(|p| Bytes::from(p.to_string())).collect())
    }

    /// A reply driven chunk by chunk from the test.
    pub fn fed() -> (ReplyFeeder, MockReply) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ReplyFeeder { tx }, MockReply::Fed(rx))
    }
}

/// Sending half of a [`MockReply::Fed`] stream.
#[derive(Debug, Clone)]
pub struct ReplyFeeder {
    tx: mpsc::UnboundedSender<Result<Bytes, TransportError>>,
}

impl ReplyFeeder {
    /// Returns false once the stream side is gone.
    pub fn send(&self, text: &str) -> bool {
        self.tx.send(Ok(Bytes::from(text.to_string()))).is_ok()
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> bool {
        self.tx.send(Ok(Bytes::copy_from_slice(bytes))).is_ok()
    }

    pub fn fail(&self, err: TransportError) -> bool {
        self.tx.send(Err(err)).is_ok()
    }
}

/// Completion provider that plays back queued [`MockReply`]s in order.
///
/// Records every request and counts every `abort` call on the streams it
/// handed out.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    aborts: Arc<AtomicUsize>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Total `abort` calls across all streams.
    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn open(
        &self,
        request: &CompletionRequest,
    ) -> Result<Box<dyn ReplyStream>, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Connection("no scripted reply".to_string()))?;

        let source = match reply {
            MockReply::OpenError(err) => return Err(err),
            MockReply::Chunks(chunks) => Source::Queue(chunks.into_iter().map(Ok).collect()),
            MockReply::ChunksThenError(chunks, err) => {
                let mut queue: VecDeque<_> = chunks.into_iter().map(Ok).collect();
                queue.push_back(Err(err));
                Source::Queue(queue)
            }
            MockReply::Fed(rx) => Source::Fed(rx),
        };

        Ok(Box::new(MockReplyStream {
            source: Some(source),
            aborts: Arc::clone(&self.aborts),
        }))
    }
}

enum Source {
    Queue(VecDeque<Result<Bytes, TransportError>>),
    Fed(mpsc::UnboundedReceiver<Result<Bytes, TransportError>>),
}

struct MockReplyStream {
    source: Option<Source>,
    aborts: Arc<AtomicUsize>,
}

#[async_trait]
impl ReplyStream for MockReplyStream {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, TransportError>> {
        match self.source.as_mut()? {
            Source::Queue(queue) => queue.pop_front(),
            Source::Fed(rx) => rx.recv().await,
        }
    }

    fn abort(&mut self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.source = None;
    }
}
