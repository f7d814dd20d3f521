//! Handshake target: scheme, host, port and request resource.

use url::Url;

use crate::error::{Error, Result};

/// URL scheme of a WebSocket endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain `ws://` (also accepted as `http://`).
    Ws,
    /// TLS `wss://` (also accepted as `https://`).
    Wss,
}

impl Scheme {
    /// Parse a URL scheme name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for anything other than `ws`, `wss`,
    /// `http` or `https`.
    pub fn parse(scheme: &str) -> Result<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "ws" | "http" => Ok(Scheme::Ws),
            "wss" | "https" => Ok(Scheme::Wss),
            other => Err(Error::InvalidUrl(format!("Unsupported scheme: {}", other))),
        }
    }

    /// Port used when the URL does not name one.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Scheme::Ws => 80,
            Scheme::Wss => 443,
        }
    }

    /// Whether the channel must be wrapped in TLS.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self, Scheme::Wss)
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Ws => write!(f, "ws"),
            Scheme::Wss => write!(f, "wss"),
        }
    }
}

/// Where one handshake attempt connects and what it requests.
///
/// Immutable for the duration of an attempt; a redirect produces a whole new
/// `Endpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
    resource: String,
}

impl Endpoint {
    /// Build an endpoint from parts. `port` defaults per scheme, and an empty
    /// `resource` becomes `/`.
    #[must_use]
    pub fn new(
        scheme: Scheme,
        host: impl Into<String>,
        port: Option<u16>,
        resource: impl Into<String>,
    ) -> Self {
        let resource = resource.into();
        Self {
            scheme,
            host: host.into(),
            port: port.unwrap_or(scheme.default_port()),
            resource: if resource.is_empty() {
                "/".to_string()
            } else {
                resource
            },
        }
    }

    /// Parse a `ws://`, `wss://`, `http://` or `https://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL does not parse, has an
    /// unsupported scheme or has no host.
    pub fn parse(url: &str) -> Result<Self> {
        Self::from_url(&Url::parse(url)?)
    }

    /// Build an endpoint from an already parsed URL. Fragments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an unsupported scheme or a missing host.
    pub fn from_url(url: &Url) -> Result<Self> {
        let scheme = Scheme::parse(url.scheme())?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("Missing host: {}", url)))?;
        // IPv6 literals come back bracketed; keep the bare address for dialing.
        let host = host.trim_start_matches('[').trim_end_matches(']');

        let mut resource = url.path().to_string();
        if let Some(query) = url.query() {
            resource.push('?');
            resource.push_str(query);
        }

        Ok(Self::new(scheme, host, url.port(), resource))
    }

    /// Resolve a `Location` header value against this endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the location cannot be resolved to a
    /// WebSocket-capable URL.
    pub fn resolve(&self, location: &str) -> Result<Self> {
        let base = Url::parse(&self.url())?;
        let target = base.join(location.trim())?;
        Self::from_url(&target)
    }

    /// URL scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host name or address (IPv6 without brackets).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to dial, with the scheme default applied.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request target: path plus optional `?query`.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Whether the channel must be wrapped in TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.scheme.is_secure()
    }

    /// Value for the `Host` header; the port is included only when it is not
    /// the scheme default.
    #[must_use]
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == self.scheme.default_port() {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// Whether both endpoints share scheme, host and port. Host names compare
    /// without regard to ASCII case.
    #[must_use]
    pub fn same_origin(&self, other: &Endpoint) -> bool {
        self.scheme == other.scheme
            && self.port == other.port
            && self.host.eq_ignore_ascii_case(&other.host)
    }

    /// The endpoint as a URL string, e.g. `wss://example.com:8443/chat?x=1`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host_header(), self.resource)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
