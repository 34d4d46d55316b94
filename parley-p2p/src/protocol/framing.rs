//! Wire frame codec.
//!
//! Frames are laid out as (all integers big-endian):
//! - 4 bytes: message kind tag (Register=1, Text=2, Ack=3)
//! - Register: 4 bytes key length L, L key bytes, 2 bytes listening port
//! - Text: 4 bytes body length L, L bytes of UTF-8 body
//! - Ack: 4 bytes ack kind tag (Received=1, Unregistered=2, Invalid=3)
//!
//! [`encode`] and [`decode`] work on whole frames. [`WireCodec`] adapts them
//! to `tokio_util::codec` for use over a `Framed<TcpStream, _>`, enforcing
//! the configured maximum frame size.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::DEFAULT_MAX_FRAME_SIZE;
use crate::error::{FrameError, P2pError, P2pResult};
use crate::protocol::{AckKind, MessageKind, WireMessage};

/// Size of the message kind tag.
pub const TAG_SIZE: usize = 4;

/// Size of a length prefix.
const LENGTH_SIZE: usize = 4;

/// Size of the listening port field.
const PORT_SIZE: usize = 2;

/// Size of the tag plus the first fixed field, enough to size any frame.
const HEADER_SIZE: usize = TAG_SIZE + LENGTH_SIZE;

impl MessageKind {
    /// Smallest valid frame for this kind.
    pub fn min_frame_size(self) -> usize {
        match self {
            MessageKind::Register => HEADER_SIZE + PORT_SIZE,
            MessageKind::Text => HEADER_SIZE,
            MessageKind::Ack => HEADER_SIZE,
        }
    }
}

/// Exact encoded size of a message.
pub fn encoded_len(message: &WireMessage) -> usize {
    match message {
        WireMessage::Register { public_key, .. } => HEADER_SIZE + public_key.len() + PORT_SIZE,
        WireMessage::Text { body } => HEADER_SIZE + body.len(),
        WireMessage::Ack { .. } => HEADER_SIZE,
    }
}

/// Append the encoding of `message` to `dst`.
pub fn encode_into(message: &WireMessage, dst: &mut BytesMut) {
    dst.reserve(encoded_len(message));
    dst.put_u32(message.kind().tag());

    match message {
        WireMessage::Register {
            public_key,
            listening_port,
        } => {
            dst.put_u32(public_key.len() as u32);
            dst.put_slice(public_key);
            dst.put_u16(*listening_port);
        }
        WireMessage::Text { body } => {
            dst.put_u32(body.len() as u32);
            dst.put_slice(body.as_bytes());
        }
        WireMessage::Ack { kind } => {
            dst.put_u32(kind.tag());
        }
    }
}

/// Encode a message into a standalone frame.
pub fn encode(message: &WireMessage) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(message));
    encode_into(message, &mut buf);
    buf.freeze()
}

fn read_u32(src: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]])
}

fn read_u16(src: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([src[at], src[at + 1]])
}

fn truncated(needed: usize, available: usize) -> FrameError {
    FrameError::TruncatedFrame { needed, available }
}

/// Read the message kind from the start of a buffer.
fn read_kind(src: &[u8]) -> Result<MessageKind, FrameError> {
    if src.len() < TAG_SIZE {
        return Err(FrameError::MalformedFrame { len: src.len() });
    }
    let tag = read_u32(src, 0);
    MessageKind::from_tag(tag).ok_or(FrameError::UnknownMessageKind(tag))
}

/// Total length of the frame at the start of `src`, once knowable.
///
/// Returns `Ok(None)` while too few bytes have arrived to tell. Fails as
/// soon as the tag is known to be bad.
pub fn frame_len(src: &[u8]) -> Result<Option<usize>, FrameError> {
    if src.len() < TAG_SIZE {
        return Ok(None);
    }
    let kind = read_kind(src)?;
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let declared = read_u32(src, TAG_SIZE) as usize;
    let len = match kind {
        MessageKind::Register => HEADER_SIZE.saturating_add(declared).saturating_add(PORT_SIZE),
        MessageKind::Text => HEADER_SIZE.saturating_add(declared),
        MessageKind::Ack => HEADER_SIZE,
    };
    Ok(Some(len))
}

/// Decode one frame from a fully read buffer.
///
/// Bytes after the end of the frame are ignored.
pub fn decode(src: &[u8]) -> Result<WireMessage, FrameError> {
    let kind = read_kind(src)?;
    if src.len() < kind.min_frame_size() {
        return Err(truncated(kind.min_frame_size(), src.len()));
    }

    match kind {
        MessageKind::Register => {
            let key_len = read_u32(src, TAG_SIZE) as usize;
            let needed = HEADER_SIZE.saturating_add(key_len).saturating_add(PORT_SIZE);
            if needed > src.len() {
                return Err(truncated(needed, src.len()));
            }
            let key_end = HEADER_SIZE + key_len;
            Ok(WireMessage::Register {
                public_key: src[HEADER_SIZE..key_end].to_vec(),
                listening_port: read_u16(src, key_end),
            })
        }
        MessageKind::Text => {
            let body_len = read_u32(src, TAG_SIZE) as usize;
            let needed = HEADER_SIZE.saturating_add(body_len);
            if needed > src.len() {
                return Err(truncated(needed, src.len()));
            }
            let body = std::str::from_utf8(&src[HEADER_SIZE..needed])
                .map_err(|_| FrameError::InvalidText)?;
            Ok(WireMessage::Text {
                body: body.to_owned(),
            })
        }
        MessageKind::Ack => {
            let tag = read_u32(src, TAG_SIZE);
            let kind = AckKind::from_tag(tag).ok_or(FrameError::UnknownAckKind(tag))?;
            Ok(WireMessage::Ack { kind })
        }
    }
}

/// Frame codec bounded by a maximum frame size.
#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    max_frame_size: usize,
}

impl WireCodec {
    /// Create a codec accepting frames up to `max_frame_size` bytes.
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Reject a declared frame length above the maximum.
    fn check_declared(&self, src: &[u8]) -> Result<(), FrameError> {
        match frame_len(src)? {
            Some(len) if len > self.max_frame_size => Err(truncated(len, self.max_frame_size)),
            _ => Ok(()),
        }
    }

    /// Decode one fully read frame, enforcing the maximum frame size.
    pub fn decode_frame(&self, src: &[u8]) -> Result<WireMessage, FrameError> {
        self.check_declared(src)?;
        decode(src)
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for WireCodec {
    type Item = WireMessage;
    type Error = P2pError;

    fn decode(&mut self, src: &mut BytesMut) -> P2pResult<Option<Self::Item>> {
        let len = match frame_len(src)? {
            Some(len) => len,
            None => return Ok(None),
        };

        // Checked before reserving, so a hostile length never allocates.
        if len > self.max_frame_size {
            return Err(truncated(len, self.max_frame_size).into());
        }

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        let frame = src.split_to(len);
        Ok(Some(decode(&frame)?))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> P2pResult<Option<Self::Item>> {
        if let Some(message) = Decoder::decode(self, src)? {
            return Ok(Some(message));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Stream ended mid-frame: report why the leftover does not decode.
        let leftover = src.split();
        match decode(&leftover) {
            Ok(message) => Ok(Some(message)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Encoder<WireMessage> for WireCodec {
    type Error = P2pError;

    fn encode(&mut self, message: WireMessage, dst: &mut BytesMut) -> P2pResult<()> {
        let size = encoded_len(&message);
        if size > self.max_frame_size {
            return Err(P2pError::MessageTooLarge {
                size,
                max: self.max_frame_size,
            });
        }

        encode_into(&message, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<WireMessage> {
        vec![
            WireMessage::Register {
                public_key: vec![0xAB; 32],
                listening_port: 8000,
            },
            WireMessage::Register {
                public_key: Vec::new(),
                listening_port: u16::MAX,
            },
            WireMessage::Text {
                body: "hello".to_string(),
            },
            WireMessage::Text {
                body: String::new(),
            },
            WireMessage::Text {
                body: "grüße 👋".to_string(),
            },
            WireMessage::ack(AckKind::Received),
            WireMessage::ack(AckKind::Unregistered),
            WireMessage::ack(AckKind::Invalid),
        ]
    }

    #[test]
    fn test_roundtrip() {
        for message in samples() {
            let frame = encode(&message);
            assert_eq!(frame.len(), encoded_len(&message));
            assert_eq!(decode(&frame).unwrap(), message);
        }
    }

    #[test]
    fn test_exact_layout() {
        let frame = encode(&WireMessage::Register {
            public_key: vec![9, 8, 7],
            listening_port: 0x1F40,
        });
        assert_eq!(
            &frame[..],
            &[0, 0, 0, 1, 0, 0, 0, 3, 9, 8, 7, 0x1F, 0x40][..]
        );

        let frame = encode(&WireMessage::Text { body: "hi".into() });
        assert_eq!(&frame[..], &[0, 0, 0, 2, 0, 0, 0, 2, b'h', b'i'][..]);

        let frame = encode(&WireMessage::ack(AckKind::Unregistered));
        assert_eq!(&frame[..], &[0, 0, 0, 3, 0, 0, 0, 2][..]);
    }

    #[test]
    fn test_last_byte_removed_fails() {
        for message in samples() {
            let frame = encode(&message);
            let result = decode(&frame[..frame.len() - 1]);
            assert!(
                matches!(
                    result,
                    Err(FrameError::TruncatedFrame { .. }) | Err(FrameError::MalformedFrame { .. })
                ),
                "{} decoded from a short frame: {:?}",
                message,
                result
            );
        }
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        assert_eq!(decode(&[]), Err(FrameError::MalformedFrame { len: 0 }));
        assert_eq!(decode(&[0, 0, 0]), Err(FrameError::MalformedFrame { len: 3 }));
    }

    #[test]
    fn test_unknown_message_kind() {
        assert_eq!(
            decode(&99u32.to_be_bytes()),
            Err(FrameError::UnknownMessageKind(99))
        );
    }

    #[test]
    fn test_unknown_ack_kind() {
        let mut buf = BytesMut::new();
        buf.put_u32(3);
        buf.put_u32(7);
        assert_eq!(decode(&buf), Err(FrameError::UnknownAckKind(7)));
    }

    #[test]
    fn test_invalid_utf8_text() {
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_u32(2);
        buf.put_slice(&[0xC3, 0x28]);
        assert_eq!(decode(&buf), Err(FrameError::InvalidText));
    }

    #[test]
    fn test_declared_length_overruns_buffer() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u32(u32::MAX);
        buf.put_slice(&[0u8; 6]);
        assert!(matches!(
            decode(&buf),
            Err(FrameError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = BytesMut::from(&encode(&WireMessage::ack(AckKind::Received))[..]);
        buf.put_slice(b"junk");
        assert_eq!(decode(&buf).unwrap(), WireMessage::ack(AckKind::Received));
    }

    #[test]
    fn test_oversized_text_rejected_before_allocation() {
        let codec = WireCodec::new(64);

        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_u32(1_000_000);
        buf.put_slice(b"abc");

        assert_eq!(
            codec.decode_frame(&buf),
            Err(FrameError::TruncatedFrame {
                needed: 1_000_008,
                available: 64
            })
        );

        // The streaming decoder rejects it without reserving room for the body.
        let mut codec = WireCodec::new(64);
        let capacity = buf.capacity();
        let result = Decoder::decode(&mut codec, &mut buf);
        assert!(matches!(
            result,
            Err(P2pError::Frame(FrameError::TruncatedFrame { .. }))
        ));
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn test_codec_roundtrip() {
        let mut codec = WireCodec::default();
        let mut buf = BytesMut::new();

        for message in samples() {
            codec.encode(message, &mut buf).unwrap();
        }
        for message in samples() {
            assert_eq!(Decoder::decode(&mut codec, &mut buf).unwrap(), Some(message));
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_partial_frame() {
        let mut codec = WireCodec::default();
        let frame = encode(&WireMessage::Text {
            body: "partial".into(),
        });

        let mut buf = BytesMut::from(&frame[..3]);
        assert!(Decoder::decode(&mut codec, &mut buf).unwrap().is_none());

        buf.extend_from_slice(&frame[3..9]);
        assert!(Decoder::decode(&mut codec, &mut buf).unwrap().is_none());

        buf.extend_from_slice(&frame[9..]);
        assert_eq!(
            Decoder::decode(&mut codec, &mut buf).unwrap(),
            Some(WireMessage::Text {
                body: "partial".into()
            })
        );
    }

    #[test]
    fn test_codec_unknown_kind_fails_early() {
        let mut codec = WireCodec::default();
        let mut buf = BytesMut::from(&99u32.to_be_bytes()[..]);
        assert!(matches!(
            Decoder::decode(&mut codec, &mut buf),
            Err(P2pError::Frame(FrameError::UnknownMessageKind(99)))
        ));
    }

    #[test]
    fn test_codec_eof_mid_frame() {
        let mut codec = WireCodec::default();

        let mut buf = BytesMut::from(&[0u8, 0][..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(P2pError::Frame(FrameError::MalformedFrame { len: 2 }))
        ));

        let mut buf = BytesMut::from(&encode(&WireMessage::ack(AckKind::Received))[..6]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(P2pError::Frame(FrameError::TruncatedFrame { .. }))
        ));

        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_encoder_rejects_oversized() {
        let mut codec = WireCodec::new(16);
        let mut buf = BytesMut::new();
        let result = codec.encode(
            WireMessage::Text {
                body: "x".repeat(32),
            },
            &mut buf,
        );
        assert!(matches!(
            result,
            Err(P2pError::MessageTooLarge { size: 40, max: 16 })
        ));
        assert!(buf.is_empty());
    }
}
