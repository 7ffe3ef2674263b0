//! TLS-capable TCP transport and COBS framing shared by the hub, notifier,
//! and submitter.

pub mod cert;
pub mod codec;
pub mod connect;
pub mod endpoint;
pub mod error;
pub mod profile_file;
pub mod stream;

pub use cert::CertProfile;
pub use codec::{CobsCodec, MAX_FRAME_SIZE};
pub use endpoint::{Endpoint, DEFAULT_PORT};
pub use error::{Result, TransportError};
pub use profile_file::CertProfileFile;
pub use stream::TcpOrTlsStream;

use tokio_util::codec::Framed;

/// A COBS-framed, message-oriented stream over TCP/TLS.
pub type MessageStream = Framed<TcpOrTlsStream, CobsCodec>;

pub fn framed(stream: TcpOrTlsStream) -> MessageStream {
    Framed::new(stream, CobsCodec)
}
