//! Minimal HTTP upgrade server for integration testing.
//!
//! Each accepted connection has its request head read and handed to a
//! handler, which returns the raw bytes to send back. The socket then stays
//! open until the client hangs up.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub type Handler = Arc<dyn Fn(&str) -> Vec<u8> + Send + Sync>;

pub struct TestServer {
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server on a random local port.
    pub async fn spawn(handler: impl Fn(&str) -> Vec<u8> + Send + Sync + 'static) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler: Handler = Arc::new(handler);

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                tokio::spawn(serve(stream, handler));
            }
        });

        (Self { handle }, addr)
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Read one request head from `stream`, answer it and wait for EOF.
pub async fn serve<S>(mut stream: S, handler: Handler)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(request) = read_head(&mut stream).await else {
        return;
    };
    let response = handler(&request);
    if stream.write_all(&response).await.is_err() {
        return;
    }
    let _ = stream.flush().await;

    let mut sink = [0u8; 256];
    while let Ok(n) = stream.read(&mut sink).await {
        if n == 0 {
            break;
        }
    }
}

async fn read_head<S: AsyncRead + Unpin>(stream: &mut S) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf).ok()
}
