//! Incremental loading and grouping of the conversation list.

mod grouping;
mod loader;

pub use grouping::{group_by_date, ChatGroup, DateBucket};
pub use loader::ChatListLoader;
