//! Completion-stream transport errors.

use thiserror::Error;

use crate::traits::HttpError;

/// Failure to open or read the reply stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The provider answered with a non-success status.
    #[error("completion request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider answered successfully but without a body.
    #[error("completion response has no body")]
    MissingBody,

    #[error("could not reach the completion provider: {0}")]
    Connection(String),

    #[error("completion request timed out: {0}")]
    Timeout(String),

    /// The stream broke after it was opened.
    #[error("reading the reply stream failed: {0}")]
    Read(String),
}

impl TransportError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Status { .. } => "TRANSPORT_STATUS",
            TransportError::MissingBody => "TRANSPORT_MISSING_BODY",
            TransportError::Connection(_) => "TRANSPORT_CONNECTION",
            TransportError::Timeout(_) => "TRANSPORT_TIMEOUT",
            TransportError::Read(_) => "TRANSPORT_READ",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status { status, .. } => {
                format!("The model service returned an error ({}).", status)
            }
            TransportError::MissingBody => "The model service sent an empty response.".to_string(),
            TransportError::Connection(_) => "Could not connect to the model service.".to_string(),
            TransportError::Timeout(_) => "The model service did not answer in time.".to_string(),
            TransportError::Read(_) => {
                "The reply was interrupted. The partial answer has been kept.".to_string()
            }
        }
    }
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ServerError { status, message } => TransportError::Status { status, message },
            HttpError::ConnectionFailed(msg) | HttpError::InvalidUrl(msg) => {
                TransportError::Connection(msg)
            }
            HttpError::Timeout(msg) => TransportError::Timeout(msg),
            HttpError::Io(msg) | HttpError::Other(msg) => TransportError::Read(msg),
        }
    }
}
