use thiserror::Error;

/// Errors produced while establishing or tearing down a transport connection.
///
/// Grounded on `hotaru_core::connection::error::ConnectionError`, trimmed to
/// the subset of failure modes the hub/notifier/submitter actually hit: no
/// HTTP, database, or pooling variants survive the trip.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("connect timed out")]
    ConnectTimeout,

    #[error("could not resolve host '{0}' into a TLS server name")]
    HostResolution(String),

    #[error("could not read certificate material at '{path}': {source}")]
    CertRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable certificate found in '{0}'")]
    NoCertificate(String),

    #[error("no private key found in '{0}'")]
    NoPrivateKey(String),

    #[error("invalid hub endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("frame exceeded the maximum size of {max} bytes (got {got})")]
    FrameTooLarge { max: usize, got: usize },

    #[error("frame was not valid COBS-encoded data: {0}")]
    Cobs(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
