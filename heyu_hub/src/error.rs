use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Transport(#[from] heyu_transport::TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no listen endpoints configured")]
    NoListenEndpoints,
}

pub type Result<T> = std::result::Result<T, HubError>;
