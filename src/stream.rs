//! The authenticated byte stream returned by a connect.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// A byte stream that is already past the mTLS handshake and metadata
/// exchange.
///
/// To the downstream PostgreSQL driver this is indistinguishable from a
/// connected TCP socket: the first byte read is the first byte the server
/// wrote after its exchange response, and nothing is buffered in between.
/// Bound individual reads and writes with `tokio::time::timeout` where a
/// deadline is needed.
///
/// The TLS state is boxed to keep the value cheap to move.
pub struct AuthenticatedChannel {
    inner: Box<TlsStream<TcpStream>>,
}

impl std::fmt::Debug for AuthenticatedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedChannel").finish_non_exhaustive()
    }
}

impl AuthenticatedChannel {
    pub(crate) fn new(stream: TlsStream<TcpStream>) -> Self {
        Self {
            inner: Box::new(stream),
        }
    }

    /// The negotiated TLS protocol version.
    pub fn tls_version(&self) -> Option<&'static str> {
        self.inner.get_ref().1.protocol_version().map(|v| match v {
            rustls::ProtocolVersion::TLSv1_2 => "TLSv1.2",
            rustls::ProtocolVersion::TLSv1_3 => "TLSv1.3",
            _ => "TLS (unknown version)",
        })
    }

    /// The negotiated cipher suite.
    pub fn cipher_suite(&self) -> Option<&'static str> {
        self.inner
            .get_ref()
            .1
            .negotiated_cipher_suite()
            .map(|cs| cs.suite().as_str().unwrap_or("TLS (unknown cipher)"))
    }

    /// The remote address of the underlying TCP connection.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.get_ref().0.peer_addr()
    }

    /// Gracefully close the channel, sending a TLS close-notify.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }
}

impl AsyncRead for AuthenticatedChannel {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for AuthenticatedChannel {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut *self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().inner).poll_shutdown(cx)
    }
}
