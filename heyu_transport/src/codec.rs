//! COBS framing over a byte stream.
//!
//! Each protocol frame is COBS-encoded and terminated with a zero byte, the
//! same delimiter scheme as the original `tendril.COBSFramer`. Implemented
//! as a `tokio_util::codec::{Encoder, Decoder}` pair in the style of
//! `hotaru_core`'s use of `tokio_util::codec` (the crate is already part of
//! its dependency stack), rather than hand-rolling the buffering that
//! `Framed` already provides.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::TransportError;

/// Frames larger than this (post COBS-decoding) are rejected outright, so a
/// misbehaving or hostile peer cannot force unbounded buffering.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct CobsCodec;

impl Encoder<Bytes> for CobsCodec {
    type Error = TransportError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                max: MAX_FRAME_SIZE,
                got: item.len(),
            });
        }
        let encoded = cobs::encode_vec(&item);
        dst.reserve(encoded.len() + 1);
        dst.put_slice(&encoded);
        dst.put_u8(0);
        Ok(())
    }
}

impl Decoder for CobsCodec {
    type Item = Bytes;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(zero_at) = src.iter().position(|&b| b == 0) else {
            if src.len() > MAX_FRAME_SIZE {
                return Err(TransportError::FrameTooLarge {
                    max: MAX_FRAME_SIZE,
                    got: src.len(),
                });
            }
            return Ok(None);
        };

        let mut encoded = src.split_to(zero_at);
        src.advance(1); // drop the trailing zero delimiter

        if encoded.is_empty() {
            // A bare delimiter (keepalive/empty frame) decodes to nothing.
            return self.decode(src);
        }

        let decoded = cobs::decode_vec(&mut encoded).map_err(|e| TransportError::Cobs(format!("{:?}", e)))?;
        if decoded.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                max: MAX_FRAME_SIZE,
                got: decoded.len(),
            });
        }
        Ok(Some(Bytes::from(decoded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_frame() {
        let mut codec = CobsCodec;
        let mut buf = BytesMut::new();
        let payload = Bytes::from_static(b"hello\x00world");
        codec.encode(payload.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn buffers_partial_frames() {
        let mut codec = CobsCodec;
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from_static(b"abc"), &mut buf).unwrap();
        let mut partial = buf.split_to(buf.len() - 1);
        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn decodes_two_consecutive_frames_from_one_buffer() {
        let mut codec = CobsCodec;
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from_static(b"one"), &mut buf).unwrap();
        codec.encode(Bytes::from_static(b"two"), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first, Bytes::from_static(b"one"));
        assert_eq!(second, Bytes::from_static(b"two"));
    }

    #[test]
    fn rejects_oversized_frame() {
        let mut codec = CobsCodec;
        let mut buf = BytesMut::new();
        let huge = Bytes::from(vec![1u8; MAX_FRAME_SIZE + 1]);
        assert!(codec.encode(huge, &mut buf).is_err());
    }
}
