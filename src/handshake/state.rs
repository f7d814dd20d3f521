//! Handshake controller state machine.

/// Lifecycle state of a [`HandshakeController`](crate::HandshakeController).
///
/// `Idle → Connecting → AwaitingResponse → (Retrying → Connecting) | Opened | Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum HandshakeState {
    /// No attempt has started, or the last one was torn down by `disconnect`.
    #[default]
    Idle,
    /// Dialing the transport.
    Connecting,
    /// Request sent, waiting for the response header block.
    AwaitingResponse,
    /// Previous attempt asked for a retry; the transport has been closed.
    Retrying,
    /// Handshake verified; the channel belongs to the framing layer now.
    Opened,
    /// Handshake failed or was cancelled.
    Closed,
}

impl HandshakeState {
    /// Whether this state ends the controller's lifecycle.
    #[must_use]
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Opened | HandshakeState::Closed)
    }

    /// Whether an attempt is currently in flight.
    #[must_use]
    #[inline]
    pub const fn is_in_progress(&self) -> bool {
        matches!(
            self,
            HandshakeState::Connecting | HandshakeState::AwaitingResponse | HandshakeState::Retrying
        )
    }
}

impl std::fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandshakeState::Idle => write!(f, "Idle"),
            HandshakeState::Connecting => write!(f, "Connecting"),
            HandshakeState::AwaitingResponse => write!(f, "AwaitingResponse"),
            HandshakeState::Retrying => write!(f, "Retrying"),
            HandshakeState::Opened => write!(f, "Opened"),
            HandshakeState::Closed => write!(f, "Closed"),
        }
    }
}
