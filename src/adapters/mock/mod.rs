//! Test doubles for the collaborator seams.
//!
//! - [`MockHttpClient`]: canned HTTP responses, records requests
//! - [`MockCompletionProvider`]: scripted or test-fed reply streams
//! - [`RecordingRepository`]: in-memory repository with call log and fault injection

pub mod completion;
pub mod http;
pub mod repository;

pub use completion::{MockCompletionProvider, MockReply, ReplyFeeder};
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use repository::{RecordingRepository, RepoCall, RepoOp};
