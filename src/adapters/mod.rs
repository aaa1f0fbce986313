//! Implementations of the collaborator seams in `crate::traits`.
//!
//! - [`ReqwestHttpClient`]: HTTP transport over reqwest
//! - [`HttpChatRepository`]: chat server REST routes
//! - [`HttpCompletionProvider`]: streaming `/api/chat`
//! - [`InMemoryChatRepository`]: in-process store with the server's semantics
//!
//! Test doubles live in [`mock`].

pub mod http_completion;
pub mod http_repository;
pub mod memory_repository;
pub mod mock;
pub mod reqwest_http;

pub use http_completion::{HttpCompletionProvider, HttpReplyStream};
pub use http_repository::HttpChatRepository;
pub use memory_repository::{InMemoryChatRepository, DEFAULT_PAGE_SIZE};
pub use mock::{MockCompletionProvider, MockHttpClient, RecordingRepository};
pub use reqwest_http::ReqwestHttpClient;
