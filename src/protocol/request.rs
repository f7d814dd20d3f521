//! Upgrade request construction.

use crate::error::Result;
use crate::protocol::credential::Credential;
use crate::protocol::endpoint::Endpoint;
use crate::protocol::headers::{HeaderSet, validate_header_value};
use crate::protocol::nonce::NonceKey;

/// Headers the handshake itself owns; caller-supplied values are ignored.
const RESERVED_HEADERS: &[&str] = &[
    "connection",
    "upgrade",
    "sec-websocket-version",
    "sec-websocket-key",
    "sec-websocket-protocol",
];

/// The `GET` upgrade request for a single attempt.
///
/// Built fresh for every attempt from the attempt's endpoint and nonce, so no
/// header survives from one attempt into the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    endpoint: Endpoint,
    headers: HeaderSet,
}

impl HandshakeRequest {
    /// Assemble the request for `endpoint` using `nonce`.
    ///
    /// `base` headers are merged in after `Host` (which they may replace) and
    /// before the handshake headers. `Sec-WebSocket-Protocol` is only sent when
    /// `protocols` is non-empty.
    #[must_use]
    pub fn new(
        endpoint: &Endpoint,
        nonce: &NonceKey,
        protocols: &[String],
        base: &HeaderSet,
        credential: Option<&Credential>,
    ) -> Self {
        let mut headers = HeaderSet::new();
        headers.insert("Host", endpoint.host_header());

        for (name, value) in base.iter() {
            if RESERVED_HEADERS.iter().any(|r| name.eq_ignore_ascii_case(r)) {
                continue;
            }
            if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("authorization") {
                headers.insert(name, value);
            } else {
                headers.append(name, value);
            }
        }

        if let Some(credential) = credential {
            headers.insert("Authorization", credential.authorization());
        }

        headers.append("Upgrade", "websocket");
        headers.append("Connection", "Upgrade");
        headers.append("Sec-WebSocket-Key", nonce.as_str());
        headers.append("Sec-WebSocket-Version", "13");
        if !protocols.is_empty() {
            headers.append("Sec-WebSocket-Protocol", protocols.join(", "));
        }

        Self {
            endpoint: endpoint.clone(),
            headers,
        }
    }

    /// Target of this request.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Headers in the order they will be written.
    #[must_use]
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Write the HTTP request to a buffer.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderValue` if any header or the request target
    /// contains CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        validate_header_value("request-target", self.endpoint.resource())?;
        buf.extend_from_slice(b"GET ");
        buf.extend_from_slice(self.endpoint.resource().as_bytes());
        buf.extend_from_slice(b" HTTP/1.1\r\n");
        self.headers.write_to(buf)?;
        buf.extend_from_slice(b"\r\n");
        Ok(())
    }

    /// Serialize the request into a fresh buffer.
    ///
    /// # Errors
    /// See [`HandshakeRequest::write`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(256);
        self.write(&mut buf)?;
        Ok(buf)
    }
}
