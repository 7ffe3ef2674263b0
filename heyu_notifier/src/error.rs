use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error(transparent)]
    Transport(#[from] heyu_transport::TransportError),

    #[error(transparent)]
    Proto(#[from] heyu_proto::ProtoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("script template references unknown field '{0}'")]
    UnknownTemplateField(String),

    #[error("script template has an unescaped brace")]
    UnescapedBrace,
}

pub type Result<T> = std::result::Result<T, NotifierError>;
