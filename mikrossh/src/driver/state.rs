//! Session lifecycle states.

use std::fmt;

/// Where a [`Session`](super::Session) is in its lifecycle.
///
/// `Unauthenticated → Authenticating → PromptDetected → Ready`, and `Closed`
/// once the stream ends. Config mode is not a state: the device has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No stream yet.
    #[default]
    Unauthenticated,

    /// Connector is logging in, or the stream is open but not yet prepared.
    Authenticating,

    /// Base prompt captured; the buffer is being settled.
    PromptDetected,

    /// Commands may be sent.
    Ready,

    /// Stream closed. Terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::PromptDetected => "prompt-detected",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
