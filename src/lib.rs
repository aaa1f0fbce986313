//! chatline - streaming chat client core
//!
//! Keeps an in-memory conversation view in step with a persisted backend
//! while model replies stream in, with mid-stream stop, regeneration and
//! paged conversation history.

pub mod adapters;
pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pagination;
pub mod prelude;
pub mod state;
pub mod telemetry;
pub mod traits;
