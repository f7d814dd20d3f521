//! # wsdial - WebSocket client opening handshake
//!
//! `wsdial` performs the client side of the RFC 6455 opening handshake: it
//! builds the HTTP upgrade request, verifies the server's answer, follows
//! redirects and authentication challenges, and hands an upgraded transport
//! to whatever speaks frames next.
//!
//! ## Features
//!
//! - **Fresh nonce per attempt** from the OS CSPRNG, with exact
//!   `Sec-WebSocket-Accept` verification
//! - **Ordered validation** of status, `Connection`, `Upgrade`, accept key and
//!   subprotocol, each failure mapped to a close code and reason
//! - **Bounded retries** for 3xx redirects and `401` challenges
//! - **Pluggable transport** with a tokio TCP implementation and optional
//!   rustls for `wss://`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsdial::{Config, client};
//!
//! let config = Config::new().with_protocols(["chat"]);
//! let upgraded = client::connect("ws://127.0.0.1:9001/chat", config).await?;
//! println!("negotiated {:?}", upgraded.negotiated);
//! ```

pub mod close;
pub mod config;
pub mod error;
pub mod handshake;
pub mod protocol;
pub mod transport;

#[cfg(feature = "async-tokio")]
pub mod client;

#[cfg(feature = "tls-rustls")]
pub mod tls;

pub use close::CloseCode;
pub use config::{Config, Limits, Timeouts};
pub use error::{Error, Result};
pub use handshake::{
    HandshakeController, HandshakeObserver, HandshakeOutcome, HandshakeState, Negotiated,
    ResponseClassifier, RetryDecision, RetryPolicy, StandardRetryPolicy, Verdict,
};
pub use protocol::{
    Credential, Endpoint, HandshakeRequest, HeaderSet, NonceKey, OsRandom, ParsedResponse,
    RandomSource, Scheme, WS_GUID, compute_accept_key,
};
pub use transport::Transport;

#[cfg(feature = "async-tokio")]
pub use transport::TcpTransport;
