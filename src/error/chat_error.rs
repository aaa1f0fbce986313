//! Unified error type for the chat client core.
//!
//! `ChatError` folds the per-concern errors into one enum so every engine
//! and loader operation can return a single `ChatResult<T>`.

use thiserror::Error;

use super::category::ErrorCategory;
use super::persistence::PersistenceError;
use super::transport::TransportError;
use super::validation::ValidationError;
use crate::config::ConfigError;

#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ChatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Validation(_) => ErrorCategory::Validation,
            ChatError::Transport(_) => ErrorCategory::Transport,
            ChatError::Persistence(_) => ErrorCategory::Persistence,
            ChatError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Validation(err) => err.error_code(),
            ChatError::Transport(err) => err.error_code(),
            ChatError::Persistence(err) => err.error_code(),
            ChatError::Configuration(_) => "CONFIGURATION",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Validation(err) => err.user_message(),
            ChatError::Transport(err) => err.user_message(),
            ChatError::Persistence(err) => err.user_message(),
            ChatError::Configuration(err) => format!("Invalid configuration: {}", err),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }
}

/// Result alias used across the client core.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_follows_variant() {
        let err: ChatError = ValidationError::StreamActive.into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.is_validation());

        let err: ChatError = TransportError::MissingBody.into();
        assert_eq!(err.category(), ErrorCategory::Transport);

        let err: ChatError = PersistenceError::Rejected {
            operation: "save_message",
            code: 1,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Persistence);
        assert_eq!(err.error_code(), "PERSISTENCE_REJECTED");
    }

    #[test]
    fn test_config_error_is_configuration() {
        let err: ChatError = ConfigError::InvalidBaseUrl("localhost".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.error_code(), "CONFIGURATION");
        assert!(err.user_message().contains("localhost"));
    }

    #[test]
    fn test_display_is_transparent() {
        let err: ChatError = ValidationError::BlankMessage.into();
        assert_eq!(err.to_string(), "message text is blank");
    }

    #[test]
    fn test_user_message_delegates() {
        let err: ChatError = ValidationError::StreamActive.into();
        assert!(err.user_message().contains("wait"));
    }
}
