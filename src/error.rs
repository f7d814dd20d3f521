//! Error types for the WebSocket client handshake.
//!
//! Every failure inside the handshake is eventually folded into a
//! [`HandshakeOutcome::Closed`](crate::HandshakeOutcome::Closed); these errors
//! are what the individual steps (transport, parsing, request building) report
//! before the controller maps them to a close code.

use thiserror::Error;

use crate::close::CloseCode;

/// Result type alias for handshake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while performing the opening handshake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or malformed handshake data.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// The target URL cannot be used for a WebSocket connection.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header value would break the request framing.
    #[error("Invalid value for header '{header}': {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Response header block exceeds the configured maximum.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The secure random source could not produce a nonce.
    #[error("Secure random source unavailable: {0}")]
    RandomUnavailable(String),

    /// The peer hung up, or no connection was open.
    #[error("Connection closed")]
    ConnectionClosed,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A transport step did not complete within its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// TLS setup or negotiation failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server refused the upgrade.
    #[error("Handshake rejected ({code}): {reason}")]
    Rejected {
        /// Close code reported by the handshake.
        code: CloseCode,
        /// Human-readable reason.
        reason: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::HandshakeTooLarge {
            size: 9000,
            max: 8192,
        };
        assert_eq!(err.to_string(), "Handshake too large: 9000 bytes (max: 8192)");
    }

    #[test]
    fn test_connection_closed_display() {
        assert_eq!(Error::ConnectionClosed.to_string(), "Connection closed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(msg) if msg.contains("pipe broken")));
    }

    #[test]
    fn test_error_from_url() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_rejected_display() {
        let err = Error::Rejected {
            code: CloseCode::Status(403),
            reason: "HTTP/1.1 403 Forbidden".into(),
        };
        assert_eq!(
            err.to_string(),
            "Handshake rejected (403): HTTP/1.1 403 Forbidden"
        );
    }
}
