//! Byte-oriented frame codec.
//!
//! Wire format: `SYNC (0xAA) | LEN (1..=31) | PAYLOAD[LEN] | CRC`.
//! The CRC-8 covers the payload only. There is no escape mechanism: a 0xAA
//! inside the payload is harmless because LEN fixes the frame boundary.

use crate::crc::{crc8, Crc8Digest};

/// Frame synchronization byte.
pub const SYNC: u8 = 0xAA;

/// Maximum size of a frame body (payload + CRC byte).
pub const MAX_PACKET_SIZE: usize = 32;

/// Maximum payload length a LEN byte may announce.
pub const MAX_PAYLOAD_LEN: usize = MAX_PACKET_SIZE - 1;

/// A validated frame payload (command byte plus parameters).
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_LEN>;

/// Frame-level protocol violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// LEN byte was zero or exceeded [`MAX_PAYLOAD_LEN`].
    InvalidLength { len: u8 },
    /// Payload checksum did not match the CRC byte on the wire.
    CrcMismatch { expected: u8, received: u8 },
}

/// Event produced by feeding one byte to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ParserEvent {
    /// A LEN byte was accepted; a frame body of `len + 1` bytes follows.
    FrameStarted { len: u8 },
    /// A complete frame passed CRC validation.
    Frame(Payload),
    /// The frame was rejected; the parser has returned to sync search.
    Error(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discarding bytes until a SYNC byte is seen.
    Sync,
    /// Expecting the LEN byte.
    Len,
    /// Accumulating `len` payload bytes plus the trailing CRC byte.
    Body,
}

/// Resumable three-state frame parser.
///
/// Feed bytes one at a time with [`push_byte`](Self::push_byte); the parser
/// holds partial frames across arbitrarily many calls and never times out.
/// Garbage before a SYNC byte is discarded silently (the resync path) and
/// produces no event.
pub struct FrameParser {
    state: State,
    /// Payload bytes followed by the wire CRC byte.
    buf: [u8; MAX_PACKET_SIZE],
    /// Announced payload length.
    len: usize,
    /// Bytes of the frame body accumulated so far.
    idx: usize,
}

impl FrameParser {
    /// Create a parser in the sync-search state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Sync,
            buf: [0; MAX_PACKET_SIZE],
            len: 0,
            idx: 0,
        }
    }

    /// Feed one byte to the parser.
    ///
    /// Returns `None` while a frame is still incomplete.
    pub fn push_byte(&mut self, byte: u8) -> Option<ParserEvent> {
        match self.state {
            State::Sync => {
                if byte == SYNC {
                    self.state = State::Len;
                }
                None
            }
            State::Len => {
                if byte == 0 || byte as usize > MAX_PAYLOAD_LEN {
                    self.state = State::Sync;
                    return Some(ParserEvent::Error(FrameError::InvalidLength { len: byte }));
                }
                self.len = byte as usize;
                self.idx = 0;
                self.state = State::Body;
                Some(ParserEvent::FrameStarted { len: byte })
            }
            State::Body => {
                self.buf[self.idx] = byte;
                self.idx += 1;

                if self.idx < self.len + 1 {
                    return None;
                }

                self.state = State::Sync;
                let received = self.buf[self.len];
                let expected = crc8(&self.buf[..self.len]);

                if expected == received {
                    // Length is bounded by MAX_PAYLOAD_LEN, so this cannot fail.
                    let payload = Payload::from_slice(&self.buf[..self.len]).unwrap_or_default();
                    Some(ParserEvent::Frame(payload))
                } else {
                    Some(ParserEvent::Error(FrameError::CrcMismatch { expected, received }))
                }
            }
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from [`encode_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Payload exceeds [`MAX_PAYLOAD_LEN`] or is empty.
    InvalidPayload,
    /// Output buffer cannot hold the framed bytes.
    BufferTooSmall,
}

/// Encode a command frame into `out`, returning the number of bytes written.
///
/// This is the host-side counterpart of [`FrameParser`]; the firmware itself
/// only decodes, but tests and host tooling build frames with it.
pub fn encode_frame(opcode: u8, params: &[u8], out: &mut [u8]) -> Result<usize, EncodeError> {
    let payload_len = 1 + params.len();
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(EncodeError::InvalidPayload);
    }
    let total = payload_len + 3;
    if out.len() < total {
        return Err(EncodeError::BufferTooSmall);
    }

    out[0] = SYNC;
    out[1] = payload_len as u8;
    out[2] = opcode;
    out[3..3 + params.len()].copy_from_slice(params);

    let mut digest = Crc8Digest::new();
    digest.update(opcode);
    digest.update_slice(params);
    out[total - 1] = digest.finalize();
    Ok(total)
}
