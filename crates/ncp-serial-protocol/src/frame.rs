//! Frame reassembly and encoding.

use bytes::{Buf, BytesMut};

use crate::constants::{MessageType, FRAME_HEADER_SIZE, FRAME_MAGIC, STREAM_BUFFER_SIZE};
use crate::error::FrameError;

/// One complete frame received from the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame type from the header.
    pub message_type: MessageType,
    /// The payload; always at least one byte.
    pub payload: Vec<u8>,
}

/// Reassembles frames from a byte stream that may arrive in arbitrary
/// pieces: partial headers, partial payloads, or chunks spanning the tail of
/// one frame and the head of the next.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for not-yet-complete frames.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(STREAM_BUFFER_SIZE),
        }
    }

    /// Add received bytes to the accumulator.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to take one complete frame off the front of the accumulator.
    ///
    /// Returns `Ok(Some(frame))` when a frame is complete, `Ok(None)` when
    /// more bytes are needed, and `Err` on a header violation. The error
    /// case consumes nothing, so the stream stays jammed until [`reset`].
    ///
    /// [`reset`]: FrameCodec::reset
    pub fn decode(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        if self.buffer[0] != FRAME_MAGIC {
            return Err(FrameError::BadMagic(self.buffer[0]));
        }
        let message_type = MessageType::from_byte(self.buffer[1])
            .ok_or(FrameError::BadMessageType(self.buffer[1]))?;
        let length = u16::from_be_bytes([self.buffer[2], self.buffer[3]]) as usize;
        if length == 0 {
            return Err(FrameError::ZeroLength);
        }

        if self.buffer.len() < FRAME_HEADER_SIZE + length {
            return Ok(None);
        }

        self.buffer.advance(FRAME_HEADER_SIZE);
        let payload = self.buffer.split_to(length).to_vec();
        log::debug!("rx frame (type {message_type:?}, length {length})");

        Ok(Some(Frame {
            message_type,
            payload,
        }))
    }

    /// Number of buffered, not-yet-consumed bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all receive state, including a jammed header.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Encode one frame for transmission.
    pub fn encode(message_type: MessageType, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&header_bytes(message_type, payload.len()));
        frame.extend_from_slice(payload);
        frame
    }
}

/// Build the four header bytes for a frame. Zero-length payloads are a
/// programmer error; the protocol forbids them.
pub(crate) fn header_bytes(message_type: MessageType, payload_len: usize) -> [u8; FRAME_HEADER_SIZE] {
    assert!(payload_len > 0, "frame payload must be nonzero");
    assert!(payload_len <= u16::MAX as usize, "frame payload too large");
    let length = (payload_len as u16).to_be_bytes();
    [FRAME_MAGIC, message_type as u8, length[0], length[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let encoded = FrameCodec::encode(MessageType::Management, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(encoded, vec![b'[', 1, 0, 3, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_decode_single_frame() {
        let mut codec = FrameCodec::new();
        codec.push(&FrameCodec::encode(MessageType::Management, b"hello"));

        let frame = codec.decode().unwrap().expect("complete frame");
        assert_eq!(frame.message_type, MessageType::Management);
        assert_eq!(frame.payload, b"hello");
        assert_eq!(codec.buffered_len(), 0);
        assert!(codec.decode().unwrap().is_none());
    }

    #[test]
    fn test_decode_partial_then_rest() {
        let mut codec = FrameCodec::new();
        let encoded = FrameCodec::encode(MessageType::NonManagement, b"data bytes");

        // Not even a full header yet.
        codec.push(&encoded[..3]);
        assert!(codec.decode().unwrap().is_none());

        // Header complete, payload still short.
        codec.push(&encoded[3..7]);
        assert!(codec.decode().unwrap().is_none());

        codec.push(&encoded[7..]);
        let frame = codec.decode().unwrap().expect("complete frame");
        assert_eq!(frame.payload, b"data bytes");
    }

    #[test]
    fn test_decode_two_frames_in_one_chunk() {
        let mut codec = FrameCodec::new();
        let mut chunk = FrameCodec::encode(MessageType::Management, b"first");
        chunk.extend_from_slice(&FrameCodec::encode(MessageType::NonManagement, b"second"));
        codec.push(&chunk);

        assert_eq!(codec.decode().unwrap().unwrap().payload, b"first");
        assert_eq!(codec.decode().unwrap().unwrap().payload, b"second");
        assert!(codec.decode().unwrap().is_none());
    }

    #[test]
    fn test_chunk_spanning_frame_boundary() {
        let mut codec = FrameCodec::new();
        let first = FrameCodec::encode(MessageType::Management, b"one");
        let second = FrameCodec::encode(MessageType::Management, b"two");

        // Everything except the last byte of the first frame...
        codec.push(&first[..first.len() - 1]);
        assert!(codec.decode().unwrap().is_none());

        // ...then its tail glued to the whole second frame.
        let mut tail = vec![first[first.len() - 1]];
        tail.extend_from_slice(&second);
        codec.push(&tail);

        assert_eq!(codec.decode().unwrap().unwrap().payload, b"one");
        assert_eq!(codec.decode().unwrap().unwrap().payload, b"two");
    }

    #[test]
    fn test_bad_magic_is_sticky_until_reset() {
        let mut codec = FrameCodec::new();
        codec.push(b"Xtra");

        assert_eq!(codec.decode(), Err(FrameError::BadMagic(b'X')));
        // No resynchronization: the same error repeats.
        assert_eq!(codec.decode(), Err(FrameError::BadMagic(b'X')));

        codec.reset();
        assert!(codec.decode().unwrap().is_none());
        codec.push(&FrameCodec::encode(MessageType::Management, b"ok"));
        assert_eq!(codec.decode().unwrap().unwrap().payload, b"ok");
    }

    #[test]
    fn test_bad_message_type() {
        let mut codec = FrameCodec::new();
        codec.push(&[b'[', 7, 0, 1, 0xEE]);
        assert_eq!(codec.decode(), Err(FrameError::BadMessageType(7)));
    }

    #[test]
    fn test_zero_length() {
        let mut codec = FrameCodec::new();
        codec.push(&[b'[', 1, 0, 0]);
        assert_eq!(codec.decode(), Err(FrameError::ZeroLength));
    }

    #[test]
    #[should_panic(expected = "payload must be nonzero")]
    fn test_encode_rejects_empty_payload() {
        FrameCodec::encode(MessageType::Management, &[]);
    }
}
