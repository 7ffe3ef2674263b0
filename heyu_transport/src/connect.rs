//! Establishing outbound connections and accepting inbound ones.
//!
//! Grounded on `hotaru_core::connection::builder::ConnectionBuilder::
//! try_connect`: resolve the TCP socket under a timeout, then optionally
//! layer a TLS handshake on top.

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ServerConfig};
use tokio::net::TcpStream;
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{Result, TransportError};
use crate::stream::TcpOrTlsStream;

/// Connects to `addr`, optionally upgrading to TLS against `tls_config` if
/// given. `addr` is a pre-resolved `host:port` string (see
/// [`crate::endpoint::Endpoint`]).
pub async fn connect(
    addr: &str,
    host: &str,
    tls_config: Option<Arc<ClientConfig>>,
    timeout: Duration,
) -> Result<TcpOrTlsStream> {
    let tcp = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::ConnectTimeout)??;
    tracing::debug!(addr, "tcp connected");

    let Some(config) = tls_config else {
        return Ok(TcpOrTlsStream::new_tcp(tcp));
    };

    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| TransportError::HostResolution(host.to_string()))?;
    let connector = TlsConnector::from(config);
    let tls_stream = connector.connect(server_name, tcp).await.map_err(|e| {
        tracing::warn!(addr, error = %e, "tls handshake failed");
        TransportError::Tls(e.to_string())
    })?;
    tracing::debug!(addr, "tls handshake complete");

    Ok(TcpOrTlsStream::new_tls(tls_stream.into()))
}

/// Accepts a single inbound connection on an already-bound listener,
/// optionally performing a TLS handshake as the server side.
pub async fn accept(
    tcp: TcpStream,
    tls_config: Option<Arc<ServerConfig>>,
) -> Result<TcpOrTlsStream> {
    let Some(config) = tls_config else {
        return Ok(TcpOrTlsStream::new_tcp(tcp));
    };

    let acceptor = TlsAcceptor::from(config);
    let tls_stream = acceptor.accept(tcp).await.map_err(|e| {
        tracing::warn!(error = %e, "tls handshake failed on accept");
        TransportError::Tls(e.to_string())
    })?;
    tracing::debug!("tls handshake complete (server role)");
    Ok(TcpOrTlsStream::new_tls(tls_stream.into()))
}
