//! Streaming completion seam.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::models::CompletionRequest;

/// Opens reply streams for a conversation history.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Open a reply stream.
    ///
    /// Fails with a [`TransportError`] when the provider answers with a
    /// non-success status or without a body. No bytes have been consumed
    /// at that point.
    async fn open(&self, request: &CompletionRequest) -> Result<Box<dyn ReplyStream>, TransportError>;
}

/// A cancellable, incrementally read reply.
#[async_trait]
pub trait ReplyStream: Send {
    /// Next raw chunk, or `None` at end of data.
    ///
    /// After [`ReplyStream::abort`] this returns `None`.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, TransportError>>;

    /// Release the underlying resource. Idempotent.
    fn abort(&mut self);
}
