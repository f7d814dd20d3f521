//! Configuration and limits for the client handshake.

use std::time::Duration;

use crate::protocol::{Credential, HeaderSet};

/// Resource limits applied while negotiating.
///
/// These bound both memory (response size) and liveness (retry count) so a
/// misbehaving server cannot stall or exhaust the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of the response header block in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,

    /// Maximum number of retries (redirects plus authentication challenges)
    /// before the handshake gives up.
    ///
    /// Default: 5
    pub max_redirects: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_handshake_size: 8192,
            max_redirects: 5,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_handshake_size: usize, max_redirects: usize) -> Self {
        Self {
            max_handshake_size,
            max_redirects,
        }
    }
}

/// Per-step deadlines.
///
/// Each applies independently: one to the dial (including TLS), one to every
/// request write and one to every read of the response header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Dial timeout.
    ///
    /// Default: 30 seconds
    pub connect: Duration,

    /// Write timeout.
    ///
    /// Default: 60 seconds
    pub write: Duration,

    /// Read timeout.
    ///
    /// Default: 60 seconds
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            write: Duration::from_secs(60),
            read: Duration::from_secs(60),
        }
    }
}

impl Timeouts {
    /// Create new timeouts with custom values.
    #[must_use]
    pub const fn new(connect: Duration, write: Duration, read: Duration) -> Self {
        Self {
            connect,
            write,
            read,
        }
    }

    /// Use the same deadline for every step.
    #[must_use]
    pub const fn uniform(timeout: Duration) -> Self {
        Self::new(timeout, timeout, timeout)
    }
}

/// Handshake configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Step timeouts.
    pub timeouts: Timeouts,

    /// Subprotocols to advertise, in order of preference.
    ///
    /// Default: empty (no `Sec-WebSocket-Protocol` header is sent)
    pub protocols: Vec<String>,

    /// Extra headers merged into every upgrade request.
    pub headers: HeaderSet,

    /// Value for the `Origin` header.
    ///
    /// Default: None
    pub origin: Option<String>,

    /// Credential offered when the server answers with an authentication
    /// challenge. Never sent preemptively.
    ///
    /// Default: None
    pub credential: Option<Credential>,

    /// Follow 3xx redirects.
    ///
    /// Default: true
    pub follow_redirects: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            timeouts: Timeouts::default(),
            protocols: Vec::new(),
            headers: HeaderSet::new(),
            origin: None,
            credential: None,
            follow_redirects: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set timeout configuration.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the subprotocol preference list.
    #[must_use]
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Add a header to every upgrade request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the credential offered on an authentication challenge.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Enable or disable redirect following.
    #[must_use]
    pub const fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}
