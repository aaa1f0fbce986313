//! Error category classification for unified error handling.
//!
//! Every failure in the client core belongs to exactly one category, which
//! decides how it is surfaced. No category is retried automatically.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected input or an operation invoked in the wrong state.
    /// Nothing was changed.
    Validation,

    /// The completion stream could not be opened or broke while reading.
    Transport,

    /// The persistence backend refused or failed a create, update, delete or list.
    Persistence,

    /// Missing or malformed client configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Transport => "transport",
            ErrorCategory::Persistence => "persistence",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns a user-friendly description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Request not allowed right now",
            ErrorCategory::Transport => "Connection to the model failed",
            ErrorCategory::Persistence => "Saving the conversation failed",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Check your input or wait for the current reply to finish",
            ErrorCategory::Transport => "Check the connection and try again",
            ErrorCategory::Persistence => {
                "The reply is still shown but may not be saved. Try again later"
            }
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }

    /// Whether the state the user sees may differ from what was stored.
    pub fn may_diverge_from_backend(&self) -> bool {
        matches!(self, ErrorCategory::Persistence)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
