//! TLS support for secure WebSocket (wss://) handshakes.
//!
//! Uses rustls with the Mozilla root store from `webpki-roots`. Trust
//! decisions are left entirely to rustls; callers who need a different root
//! set build their own [`ClientConfig`] and pass it to
//! [`TcpTransport::with_tls_config`](crate::transport::TcpTransport::with_tls_config).

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{Error, Result};

/// Client configuration trusting the bundled webpki roots.
pub fn client_config_with_webpki_roots() -> Arc<ClientConfig> {
    let root_store = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Wraps TCP streams in client-side TLS.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            inner: tokio_rustls::TlsConnector::from(config),
        }
    }

    /// Run the TLS handshake for `domain` over `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] for an invalid server name or a failed handshake.
    pub async fn connect(&self, domain: &str, stream: TcpStream) -> Result<TlsStream<TcpStream>> {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|_| Error::Tls(format!("invalid DNS name: {}", domain)))?;

        self.inner
            .connect(server_name, stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new(client_config_with_webpki_roots())
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector").finish_non_exhaustive()
    }
}
