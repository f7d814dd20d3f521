use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::transport::{MaybeTlsStream, Transport};

#[cfg(feature = "tls-rustls")]
use crate::tls::TlsConnector;

const READ_CHUNK: usize = 1024;

/// [`Transport`] over a tokio TCP socket, with optional rustls encryption.
///
/// Bytes read past the delimiter stay buffered; after a successful handshake
/// [`TcpTransport::into_parts`] hands both the stream and those bytes to the
/// framing layer.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<MaybeTlsStream>,
    read_buf: BytesMut,
    #[cfg(feature = "tls-rustls")]
    tls: Option<TlsConnector>,
}

impl TcpTransport {
    /// Create a transport; TLS (when enabled) uses the webpki root store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport using a custom rustls client configuration.
    #[cfg(feature = "tls-rustls")]
    #[must_use]
    pub fn with_tls_config(config: std::sync::Arc<tokio_rustls::rustls::ClientConfig>) -> Self {
        Self {
            tls: Some(TlsConnector::new(config)),
            ..Self::default()
        }
    }

    /// Whether a connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Bytes received beyond the last delimiter.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        &self.read_buf
    }

    /// Take the open stream and any buffered bytes.
    #[must_use]
    pub fn into_parts(self) -> Option<(MaybeTlsStream, BytesMut)> {
        let read_buf = self.read_buf;
        self.stream.map(|stream| (stream, read_buf))
    }

    async fn open(&mut self, host: &str, port: u16, secure: bool) -> Result<MaybeTlsStream> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;

        if !secure {
            return Ok(MaybeTlsStream::Plain(tcp));
        }

        #[cfg(feature = "tls-rustls")]
        {
            let connector = self.tls.get_or_insert_with(TlsConnector::default);
            let tls = connector.connect(host, tcp).await?;
            return Ok(MaybeTlsStream::Tls(Box::new(tls)));
        }

        #[cfg(not(feature = "tls-rustls"))]
        {
            drop(tcp);
            return Err(Error::Tls(
                "wss:// requires the `tls-rustls` feature".to_string(),
            ));
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl Transport for TcpTransport {
    async fn dial(&mut self, host: &str, port: u16, secure: bool, limit: Duration) -> Result<()> {
        self.close().await;
        debug!(host, port, secure, "dialing");

        let stream = timeout(limit, self.open(host, port, secure))
            .await
            .map_err(|_| Error::Timeout(format!("connect to {}:{} after {:?}", host, port, limit)))??;

        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, data: &[u8], limit: Duration) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        trace!(len = data.len(), "writing");

        timeout(limit, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout(format!("write after {:?}", limit)))??;
        Ok(())
    }

    async fn read_until(&mut self, delimiter: &[u8], max: usize, limit: Duration) -> Result<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        let buf = &mut self.read_buf;

        timeout(limit, async {
            loop {
                if let Some(pos) = find(buf, delimiter) {
                    let end = pos + delimiter.len();
                    if end > max {
                        return Err(Error::HandshakeTooLarge { size: end, max });
                    }
                    return Ok(buf.split_to(end).to_vec());
                }
                if buf.len() >= max {
                    return Err(Error::HandshakeTooLarge {
                        size: buf.len(),
                        max,
                    });
                }

                buf.reserve(READ_CHUNK);
                let n = stream.read_buf(buf).await?;
                trace!(n, buffered = buf.len(), "read");
                if n == 0 {
                    return Err(Error::ConnectionClosed);
                }
            }
        })
        .await
        .map_err(|_| Error::Timeout(format!("read after {:?}", limit)))?
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("closing transport");
            let _ = stream.shutdown().await;
        }
        self.read_buf.clear();
    }
}
