use std::fmt;

/// Where the engine is within one send or resend.
///
/// `Idle → PersistingUserMessage → AwaitingStreamOpen → Streaming →
/// Finalizing → Idle`. A resend enters at `AwaitingStreamOpen`. `Cancelled`
/// follows `Streaming` when a stop is acknowledged and is followed by
/// `Finalizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    PersistingUserMessage,
    AwaitingStreamOpen,
    Streaming,
    Cancelled,
    Finalizing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::PersistingUserMessage => "persisting_user_message",
            Phase::AwaitingStreamOpen => "awaiting_stream_open",
            Phase::Streaming => "streaming",
            Phase::Cancelled => "cancelled",
            Phase::Finalizing => "finalizing",
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Phase::Idle
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
