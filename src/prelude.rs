//! Prelude module for convenient imports.
//!
//! ```ignore
//! use chatline::prelude::*;
//! ```

pub use crate::bus::{EventBus, SubscriptionId, Topic};
pub use crate::config::ClientConfig;
pub use crate::engine::{Phase, SendOutcome, StreamingEngine};
pub use crate::error::{ChatError, ChatResult, ErrorCategory};
pub use crate::models::{Chat, ChatPage, Message, Role};
pub use crate::pagination::{group_by_date, ChatListLoader, DateBucket};
pub use crate::state::{Action, AppState, StateField, Store, ThemeMode};
pub use crate::traits::{ChatRepository, CompletionProvider, HttpClient, ReplyStream};
