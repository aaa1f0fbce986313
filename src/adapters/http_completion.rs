//! [`CompletionProvider`] backed by the chat server's `/api/chat` route.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::error::TransportError;
use crate::models::CompletionRequest;
use crate::traits::{json_headers, ByteStream, CompletionProvider, HttpClient, ReplyStream};

/// Posts the full history and model, and streams back the raw reply text.
#[derive(Clone)]
pub struct HttpCompletionProvider {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl HttpCompletionProvider {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn open(
        &self,
        request: &CompletionRequest,
    ) -> Result<Box<dyn ReplyStream>, TransportError> {
        let body = serde_json::to_string(request)
            .map_err(|e| TransportError::Connection(format!("unencodable request: {}", e)))?;
        let url = format!("{}/api/chat", self.base_url);

        tracing::debug!(
            model = %request.model,
            history = request.messages.len(),
            "Opening completion stream"
        );

        let stream = self.http.post_stream(&url, &body, &json_headers()).await?;
        Ok(Box::new(HttpReplyStream::new(stream)))
    }
}

/// Reply stream over an HTTP response body.
pub struct HttpReplyStream {
    body: Option<ByteStream>,
}

impl HttpReplyStream {
    pub fn new(body: ByteStream) -> Self {
        Self { body: Some(body) }
    }

    pub fn is_aborted(&self) -> bool {
        self.body.is_none()
    }
}

#[async_trait]
impl ReplyStream for HttpReplyStream {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, TransportError>> {
        let body = self.body.as_mut()?;
        body.next().await.map(|chunk| chunk.map_err(TransportError::from))
    }

    fn abort(&mut self) {
        // Dropping the body closes the connection
        if self.body.take().is_some() {
            tracing::debug!("Reply stream aborted");
        }
    }
}
