//! Byte transport used by the handshake controller.
//!
//! The controller only needs four operations: dial, write, read up to a
//! delimiter, and close. [`Transport`] captures that contract so the
//! handshake can run over TCP, TLS or a scripted test double alike.
//!
//! With the `async-tokio` feature, [`TcpTransport`] implements it over
//! `tokio::net::TcpStream`, optionally wrapped in rustls (`tls-rustls`).

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

#[cfg(feature = "async-tokio")]
mod stream;
#[cfg(feature = "async-tokio")]
mod tcp;

#[cfg(feature = "async-tokio")]
pub use stream::MaybeTlsStream;
#[cfg(feature = "async-tokio")]
pub use tcp::TcpTransport;

/// Connection-oriented byte transport.
///
/// Each operation enforces its own `timeout`; elapsing it must yield
/// [`Error::Timeout`](crate::Error::Timeout). Implementations keep bytes read
/// past a delimiter for the next read.
pub trait Transport {
    /// Open a connection to `host:port`, negotiating TLS with default
    /// settings when `secure` is set. An existing connection is dropped first.
    fn dial(
        &mut self,
        host: &str,
        port: u16,
        secure: bool,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Write all of `data` and flush.
    fn write(&mut self, data: &[u8], timeout: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Read until `delimiter` has been received, returning everything up to
    /// and including it.
    ///
    /// Fails with [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge)
    /// once `limit` bytes arrive without the delimiter and with
    /// [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) on EOF.
    fn read_until(
        &mut self,
        delimiter: &[u8],
        limit: usize,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the connection. Safe to call when nothing is open.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
