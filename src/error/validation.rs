//! Errors for requests rejected before any state change.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message text is blank")]
    BlankMessage,

    #[error("a reply is already streaming")]
    StreamActive,

    #[error("no reply is streaming")]
    NotStreaming,

    #[error("there is no conversation to regenerate")]
    NothingToResend,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::BlankMessage => "VALIDATION_BLANK_MESSAGE",
            ValidationError::StreamActive => "VALIDATION_STREAM_ACTIVE",
            ValidationError::NotStreaming => "VALIDATION_NOT_STREAMING",
            ValidationError::NothingToResend => "VALIDATION_NOTHING_TO_RESEND",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ValidationError::BlankMessage => "Type a message first.".to_string(),
            ValidationError::StreamActive => {
                "Please wait for the current response to complete before sending another message."
                    .to_string()
            }
            ValidationError::NotStreaming => "Nothing to stop.".to_string(),
            ValidationError::NothingToResend => "There is nothing to regenerate yet.".to_string(),
        }
    }
}
