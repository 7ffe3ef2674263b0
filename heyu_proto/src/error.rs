use thiserror::Error;

/// Errors produced by the wire codec.
///
/// Kept flat and descriptive in the style of
/// `hotaru_core::connection::error::ConnectionError`, but derived with
/// `thiserror` since this type sits at a library boundary rather than
/// inside the application crate the teacher's hand-rolled `Display` impl
/// lives in.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("invalid PDU: not a map")]
    NotAMap,

    #[error("missing required PDU field '{0}'")]
    MissingPduField(&'static str),

    #[error("cannot handle PDUs of version {0}")]
    UnsupportedVersion(u8),

    #[error("missing required PDU field '{field}' for '{msg_type}' messages")]
    MissingArgument {
        msg_type: &'static str,
        field: &'static str,
    },

    #[error("cannot serialize into version {0}")]
    CannotSerializeVersion(u8),

    #[error("invalid urgency value {0}")]
    InvalidUrgency(u8),

    #[error("unknown urgency name '{0}'")]
    UnknownUrgencyName(String),

    #[error("malformed msgpack payload: {0}")]
    Msgpack(String),
}
