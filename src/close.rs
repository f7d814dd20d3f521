//! Close codes reported when a handshake does not open.

use crate::error::Error;

/// Close status reported to the owning connection when the handshake fails.
///
/// Uses the RFC 6455 Section 7.4 registry where a code exists, and passes a
/// rejected HTTP status through verbatim when it is below 1000 so callers can
/// tell a `403` from a `404` without re-parsing the reason string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// Normal closure (1000). Also used when the redirect budget is exhausted
    /// or the owner cancels the handshake.
    #[default]
    Normal,
    /// Protocol error (1002). The server's response violated RFC 6455, or the
    /// transport failed with no finer-grained mapping.
    ProtocolError,
    /// Policy violation (1008). Non-101 status that is not a plausible close code.
    PolicyViolation,
    /// TLS handshake failure (1015).
    TlsHandshake,
    /// HTTP status passed through as the close code (always < 1000).
    Status(u16),
    /// Any other numeric code.
    Other(u16),
}

impl CloseCode {
    /// Create a `CloseCode` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1002 => CloseCode::ProtocolError,
            1008 => CloseCode::PolicyViolation,
            1015 => CloseCode::TlsHandshake,
            0..=999 => CloseCode::Status(code),
            other => CloseCode::Other(other),
        }
    }

    /// Get the numeric value of this close code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::ProtocolError => 1002,
            CloseCode::PolicyViolation => 1008,
            CloseCode::TlsHandshake => 1015,
            CloseCode::Status(code) | CloseCode::Other(code) => *code,
        }
    }

    /// Map a final, non-101 HTTP status to a close code.
    ///
    /// Statuses below 1000 are carried through literally; anything else
    /// becomes [`CloseCode::PolicyViolation`].
    #[must_use]
    pub const fn from_http_status(status: u16) -> Self {
        if status < 1000 {
            CloseCode::Status(status)
        } else {
            CloseCode::PolicyViolation
        }
    }

    /// Map a transport-level error to the code reported on close.
    #[must_use]
    pub fn for_transport_error(err: &Error) -> Self {
        match err {
            Error::Tls(_) => CloseCode::TlsHandshake,
            _ => CloseCode::ProtocolError,
        }
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        CloseCode::from_u16(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_values() {
        assert_eq!(CloseCode::Normal.as_u16(), 1000);
        assert_eq!(CloseCode::ProtocolError.as_u16(), 1002);
        assert_eq!(CloseCode::PolicyViolation.as_u16(), 1008);
        assert_eq!(CloseCode::TlsHandshake.as_u16(), 1015);
        assert_eq!(CloseCode::Status(403).as_u16(), 403);
    }

    #[test]
    fn test_from_u16() {
        assert_eq!(CloseCode::from_u16(1000), CloseCode::Normal);
        assert_eq!(CloseCode::from_u16(1002), CloseCode::ProtocolError);
        assert_eq!(CloseCode::from_u16(404), CloseCode::Status(404));
        assert_eq!(CloseCode::from_u16(4000), CloseCode::Other(4000));
    }

    #[test]
    fn test_http_status_below_1000_passes_through() {
        assert_eq!(CloseCode::from_http_status(403), CloseCode::Status(403));
        assert_eq!(CloseCode::from_http_status(200), CloseCode::Status(200));
        assert_eq!(CloseCode::from_http_status(999), CloseCode::Status(999));
    }

    #[test]
    fn test_http_status_1000_and_above_is_policy() {
        assert_eq!(CloseCode::from_http_status(1000), CloseCode::PolicyViolation);
        assert_eq!(CloseCode::from_http_status(4242), CloseCode::PolicyViolation);
    }

    #[test]
    fn test_transport_error_mapping() {
        assert_eq!(
            CloseCode::for_transport_error(&Error::Tls("bad cert".into())),
            CloseCode::TlsHandshake
        );
        assert_eq!(
            CloseCode::for_transport_error(&Error::Timeout("connect".into())),
            CloseCode::ProtocolError
        );
        assert_eq!(
            CloseCode::for_transport_error(&Error::Io("refused".into())),
            CloseCode::ProtocolError
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CloseCode::ProtocolError.to_string(), "1002");
        assert_eq!(CloseCode::Status(401).to_string(), "401");
    }
}
