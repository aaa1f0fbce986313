//! Error handling for the chat client core.
//!
//! | Category | Raised by | Effect |
//! |----------|-----------|--------|
//! | Validation | engine guards | nothing changed |
//! | Transport | completion provider | partial reply finalized |
//! | Persistence | chat repository | view may diverge from backend |
//! | Configuration | config loader | client not started |
//!
//! No error is retried automatically.

mod category;
mod chat_error;
mod persistence;
mod transport;
mod validation;

pub use category::ErrorCategory;
pub use chat_error::{ChatError, ChatResult};
pub use persistence::PersistenceError;
pub use transport::TransportError;
pub use validation::ValidationError;
