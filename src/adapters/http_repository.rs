//! [`ChatRepository`] backed by the chat server's REST routes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::PersistenceError;
use crate::models::{ApiEnvelope, ChatPage, Message, SavedMessage};
use crate::traits::{json_headers, ChatRepository, HttpClient, HttpError, Response};

/// Talks to `/api/message/*` and `/api/chat/*` under a base URL.
///
/// Every route answers `{ "code": 0, "data": ... }`; a non-zero code or a
/// non-2xx status is reported as a [`PersistenceError`].
#[derive(Clone)]
pub struct HttpChatRepository {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl HttpChatRepository {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn id_url(&self, path: &str, id: &str) -> String {
        format!("{}{}?id={}", self.base_url, path, urlencoding::encode(id))
    }

    fn transport(operation: &'static str) -> impl FnOnce(HttpError) -> PersistenceError {
        move |source| PersistenceError::Http { operation, source }
    }

    /// Check status and envelope code, then hand back the envelope payload.
    fn unwrap_envelope<T: DeserializeOwned>(
        operation: &'static str,
        response: &Response,
    ) -> Result<Option<T>, PersistenceError> {
        if !response.is_success() {
            return Err(PersistenceError::Status {
                operation,
                status: response.status,
                message: response.text_lossy(),
            });
        }

        let envelope: ApiEnvelope<T> =
            response.json().map_err(|e| PersistenceError::Decode {
                operation,
                message: e.to_string(),
            })?;

        if !envelope.is_ok() {
            return Err(PersistenceError::Rejected {
                operation,
                code: envelope.code,
            });
        }

        Ok(envelope.data)
    }

    fn require<T>(operation: &'static str, data: Option<T>) -> Result<T, PersistenceError> {
        data.ok_or_else(|| PersistenceError::Decode {
            operation,
            message: "response has no data".to_string(),
        })
    }
}

#[async_trait]
impl ChatRepository for HttpChatRepository {
    async fn save_message(&self, message: &Message) -> Result<Message, PersistenceError> {
        const OP: &str = "save_message";

        let body = serde_json::to_string(message).map_err(|e| PersistenceError::Decode {
            operation: OP,
            message: e.to_string(),
        })?;
        let response = self
            .http
            .post(&self.url("/api/message/update"), &body, &json_headers())
            .await
            .map_err(Self::transport(OP))?;

        let saved: SavedMessage = Self::require(OP, Self::unwrap_envelope(OP, &response)?)?;
        tracing::debug!(id = %saved.message.id, chat_id = %saved.message.chat_id, "Message saved");
        Ok(saved.message)
    }

    async fn delete_message(&self, id: &str) -> Result<(), PersistenceError> {
        const OP: &str = "delete_message";

        let response = self
            .http
            .post(&self.id_url("/api/message/delete", id), "", &json_headers())
            .await
            .map_err(Self::transport(OP))?;

        Self::unwrap_envelope::<serde_json::Value>(OP, &response)?;
        Ok(())
    }

    async fn delete_chat(&self, id: &str) -> Result<(), PersistenceError> {
        const OP: &str = "delete_chat";

        let response = self
            .http
            .post(&self.id_url("/api/chat/delete", id), "", &json_headers())
            .await
            .map_err(Self::transport(OP))?;

        Self::unwrap_envelope::<serde_json::Value>(OP, &response)?;
        Ok(())
    }

    async fn list_chats(&self, page: u32) -> Result<ChatPage, PersistenceError> {
        const OP: &str = "list_chats";

        let url = format!("{}?page={}", self.url("/api/chat/list"), page);
        let response = self
            .http
            .get(&url, &json_headers())
            .await
            .map_err(Self::transport(OP))?;

        Self::require(OP, Self::unwrap_envelope(OP, &response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::models::{Chat, Role};
    use serde_json::json;

    fn repo(mock: &MockHttpClient) -> HttpChatRepository {
        HttpChatRepository::new(Arc::new(mock.clone()), "http://chat.test/")
    }

    #[tokio::test]
    async fn test_save_message_posts_json_and_returns_canonical() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://chat.test/api/message/update",
            MockResponse::Success(Response::json_body(
                200,
                &json!({"code": 0, "data": {"message": {
                    "id": 11, "role": "user", "content": "hi", "chatId": 5
                }}}),
            )),
        );

        let saved = repo(&mock)
            .save_message(&Message::user("hi", ""))
            .await
            .unwrap();
        assert_eq!(saved.id, "11");
        assert_eq!(saved.chat_id, "5");
        assert_eq!(saved.role, Role::User);

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        let sent: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["content"], "hi");
        assert_eq!(sent["chatId"], "");
    }

    #[tokio::test]
    async fn test_list_chats_unwraps_page() {
        let page = ChatPage {
            list: vec![Chat::new("c1", "First", chrono::Utc::now())],
            has_more: true,
        };
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::json_body(
            200,
            &serde_json::to_value(ApiEnvelope::ok(page.clone())).unwrap(),
        )));

        assert_eq!(repo(&mock).list_chats(1).await.unwrap(), page);
    }

    #[tokio::test]
    async fn test_nonzero_code_is_rejected() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::json_body(
            200,
            &json!({"code": -1}),
        )));

        let err = repo(&mock).delete_message("m1").await.unwrap_err();
        assert_eq!(
            err,
            PersistenceError::Rejected {
                operation: "delete_message",
                code: -1
            }
        );
    }

    #[tokio::test]
    async fn test_http_status_is_reported() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(
            500,
            bytes::Bytes::from("boom"),
        )));

        let err = repo(&mock).list_chats(1).await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Status { status: 500, ref message, .. } if message == "boom"
        ));
    }

    #[tokio::test]
    async fn test_delete_chat_encodes_id() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::json_body(
            200,
            &json!({"code": 0}),
        )));

        repo(&mock).delete_chat("a b&c").await.unwrap();
        assert_eq!(
            mock.get_requests()[0].url,
            "http://chat.test/api/chat/delete?id=a%20b%26c"
        );
    }

    #[tokio::test]
    async fn test_list_without_data_is_decode_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::json_body(
            200,
            &json!({"code": 0}),
        )));

        let err = repo(&mock).list_chats(2).await.unwrap_err();
        assert_eq!(err.error_code(), "PERSISTENCE_DECODE");
        assert_eq!(
            mock.get_requests()[0].url,
            "http://chat.test/api/chat/list?page=2"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_operation() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        let err = repo(&mock).list_chats(1).await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Http {
                operation: "list_chats",
                ..
            }
        ));
    }
}
