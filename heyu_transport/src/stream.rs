//! Abstraction over plain TCP and TLS connections, in either client or
//! server role.
//!
//! Grounded on `hotaru_core::connection::stream::TcpConnectionStream`: same
//! enum-of-variants shape, same per-variant `poll_*` delegation. Extended
//! with a server-role TLS variant since, unlike the teacher (an HTTP client
//! library), the hub here terminates inbound TLS connections as well as the
//! notifier/submitter making outbound ones.

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{self, AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::TlsStream;

/// A connection that may be plain TCP or TLS, established as either a
/// client or a server.
pub enum TcpOrTlsStream {
    Tcp(TcpStream),
    Tls(TlsStream<TcpStream>),
}

impl TcpOrTlsStream {
    pub fn new_tcp(stream: TcpStream) -> Self {
        TcpOrTlsStream::Tcp(stream)
    }

    pub fn new_tls(stream: TlsStream<TcpStream>) -> Self {
        TcpOrTlsStream::Tls(stream)
    }

    pub fn split(self) -> (ReadHalf<Self>, WriteHalf<Self>)
    where
        Self: AsyncRead + AsyncWrite + Unpin,
    {
        io::split(self)
    }

    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            TcpOrTlsStream::Tcp(stream) => stream.shutdown().await,
            TcpOrTlsStream::Tls(stream) => stream.shutdown().await,
        }
    }

    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            TcpOrTlsStream::Tcp(stream) => stream.peer_addr(),
            TcpOrTlsStream::Tls(stream) => stream.get_ref().0.peer_addr(),
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            TcpOrTlsStream::Tcp(stream) => stream.local_addr(),
            TcpOrTlsStream::Tls(stream) => stream.get_ref().0.local_addr(),
        }
    }
}

impl AsyncRead for TcpOrTlsStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TcpOrTlsStream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            TcpOrTlsStream::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TcpOrTlsStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            TcpOrTlsStream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            TcpOrTlsStream::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TcpOrTlsStream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            TcpOrTlsStream::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TcpOrTlsStream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            TcpOrTlsStream::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn peer_and_local_addr_are_available_for_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener_addr = listener.local_addr().unwrap();

        let client = TcpStream::connect(listener_addr).await.unwrap();
        let (server_stream, client_addr) = listener.accept().await.unwrap();

        let server_conn = TcpOrTlsStream::new_tcp(server_stream);
        let client_conn = TcpOrTlsStream::new_tcp(client);

        assert_eq!(server_conn.peer_addr().unwrap(), client_addr);
        assert_eq!(server_conn.local_addr().unwrap(), listener_addr);
        assert_eq!(client_conn.peer_addr().unwrap(), listener_addr);
    }
}
