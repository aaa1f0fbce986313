//! Errors reported by the persistence collaborator.

use thiserror::Error;

use crate::traits::HttpError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The backend answered with a non-zero envelope code.
    #[error("{operation} rejected by backend (code {code})")]
    Rejected { operation: &'static str, code: i32 },

    /// The backend answered with a non-success HTTP status.
    #[error("{operation} failed with status {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("{operation} could not reach the backend: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: HttpError,
    },

    #[error("{operation} returned an unreadable body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("{entity} '{id}' was not found")]
    NotFound { entity: &'static str, id: String },
}

impl PersistenceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PersistenceError::Rejected { .. } => "PERSISTENCE_REJECTED",
            PersistenceError::Status { .. } => "PERSISTENCE_STATUS",
            PersistenceError::Http { .. } => "PERSISTENCE_HTTP",
            PersistenceError::Decode { .. } => "PERSISTENCE_DECODE",
            PersistenceError::NotFound { .. } => "PERSISTENCE_NOT_FOUND",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PersistenceError::NotFound { entity, .. } => format!("The {} no longer exists.", entity),
            PersistenceError::Http { .. } => "Could not reach the chat server.".to_string(),
            _ => "The chat server could not save your change.".to_string(),
        }
    }
}
