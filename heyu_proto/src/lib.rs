//! Wire protocol types for the HeyU notification fabric.
//!
//! A [`Message`] is a self-describing, versioned protocol data unit encoded
//! as a MessagePack map (see [`message`]). [`Urgency`] carries the
//! `notify` urgency levels, and [`ProtoError`] covers everything that can
//! go wrong decoding or encoding a frame.

pub mod error;
pub mod message;
pub mod urgency;

pub use error::ProtoError;
pub use message::{Message, MessageBody, CURRENT_VERSION};
pub use urgency::Urgency;
