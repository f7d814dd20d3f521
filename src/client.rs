//! One-call client connect over tokio.

use bytes::BytesMut;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handshake::{HandshakeController, HandshakeOutcome, Negotiated};
use crate::protocol::{Credential, Endpoint};
use crate::transport::{MaybeTlsStream, TcpTransport};

/// An upgraded connection, ready for framing.
#[derive(Debug)]
pub struct Upgraded {
    /// The socket, encrypted for `wss://`.
    pub stream: MaybeTlsStream,
    /// Bytes the server sent after the handshake response.
    pub buffered: BytesMut,
    /// What the server agreed to.
    pub negotiated: Negotiated,
    /// Endpoint that accepted the upgrade, after any redirects.
    pub endpoint: Endpoint,
}

/// Connect to `url` and run the opening handshake.
///
/// Credentials embedded in the URL (`ws://user:pass@host/`) are used when
/// `config` carries none. They are only sent in answer to a challenge.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] for a malformed or non-WebSocket URL and
/// [`Error::Rejected`] when the handshake closes instead of opening.
///
/// # Example
///
/// ```rust,ignore
/// let upgraded = wsdial::client::connect("ws://127.0.0.1:9001/", wsdial::Config::new()).await?;
/// println!("subprotocol: {:?}", upgraded.negotiated.protocol);
/// ```
pub async fn connect(url: &str, config: Config) -> Result<Upgraded> {
    let parsed = Url::parse(url)?;
    let endpoint = Endpoint::from_url(&parsed)?;

    let mut config = config;
    if config.credential.is_none() {
        config.credential = Credential::from_url(&parsed);
    }

    connect_with(endpoint, TcpTransport::new(), config).await
}

/// Run the handshake to `endpoint` over a prepared transport.
///
/// Use this with [`TcpTransport::with_tls_config`] to supply custom TLS
/// trust settings.
///
/// # Errors
///
/// Returns [`Error::Rejected`] when the handshake closes instead of opening.
pub async fn connect_with(
    endpoint: Endpoint,
    transport: TcpTransport,
    config: Config,
) -> Result<Upgraded> {
    let mut controller = HandshakeController::new(transport, config);

    match controller.start(endpoint).await {
        HandshakeOutcome::Opened(negotiated) => {
            let endpoint = controller
                .endpoint()
                .cloned()
                .ok_or(Error::ConnectionClosed)?;
            let (stream, buffered) = controller
                .into_transport()
                .and_then(TcpTransport::into_parts)
                .ok_or(Error::ConnectionClosed)?;
            debug!(%endpoint, buffered = buffered.len(), "connection upgraded");
            Ok(Upgraded {
                stream,
                buffered,
                negotiated,
                endpoint,
            })
        }
        HandshakeOutcome::Closed(code, reason) => Err(Error::Rejected { code, reason }),
    }
}
