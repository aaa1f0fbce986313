//! Conversation state store.
//!
//! [`apply`] is the pure reducer over [`AppState`]; [`Store`] is the shared
//! handle that owns the state, serializes dispatches and notifies observers.

mod action;
mod app_state;
mod store;

pub use action::{apply, Action, StateField};
pub use app_state::{AppState, ThemeMode, DEFAULT_MODEL};
pub use store::{Observer, Store};
