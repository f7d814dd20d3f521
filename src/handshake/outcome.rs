//! Results produced by classifying a response.

use crate::close::CloseCode;
use crate::protocol::{Credential, Endpoint};

/// What the server agreed to in a successful handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Negotiated {
    /// Subprotocol selected by the server, if any.
    pub protocol: Option<String>,
    /// Extensions the server announced. Detected only, never enforced.
    pub extensions: Vec<String>,
}

/// Final result of a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// The upgrade was verified.
    Opened(Negotiated),
    /// The upgrade failed.
    Closed(CloseCode, String),
}

impl HandshakeOutcome {
    /// Shorthand for a `Closed` outcome.
    #[must_use]
    pub fn closed(code: CloseCode, reason: impl Into<String>) -> Self {
        HandshakeOutcome::Closed(code, reason.into())
    }

    /// Whether the channel opened.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, HandshakeOutcome::Opened(_))
    }

    /// Close code, if the handshake failed.
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        match self {
            HandshakeOutcome::Opened(_) => None,
            HandshakeOutcome::Closed(code, _) => Some(*code),
        }
    }
}

/// Whether (and how) a response asks for another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// No retry; the response is final.
    None,
    /// Try again against a new endpoint.
    Redirect(Endpoint),
    /// Try again presenting a credential.
    AuthChallenge(Credential),
}

/// Result of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Start a new attempt. Never carries [`RetryDecision::None`].
    Retry(RetryDecision),
    /// The handshake is over.
    Final(HandshakeOutcome),
}
