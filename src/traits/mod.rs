//! Collaborator seams of the client core.
//!
//! - [`HttpClient`]: HTTP transport used by the backend adapters
//! - [`ChatRepository`]: durable chats and messages
//! - [`CompletionProvider`] / [`ReplyStream`]: streaming model replies

mod completion;
mod http;
mod persistence;

pub use completion::{CompletionProvider, ReplyStream};
pub use http::{json_headers, ByteStream, Headers, HttpClient, HttpError, Response};
pub use persistence::ChatRepository;
