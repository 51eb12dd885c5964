//! CRC-8 checksum for command frames.
//!
//! Uses the CRC-8/MAXIM-DOW algorithm (poly 0x31 reflected, init 0x00,
//! xorout 0x00) with a 256-byte lookup table. The checksum covers the frame
//! payload only, never the SYNC or LEN bytes.

use crc::{Crc, CRC_8_MAXIM_DOW};

/// CRC-8/MAXIM-DOW calculator with 256-byte lookup table.
const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Calculate the CRC-8 checksum of a byte slice.
#[inline]
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Incremental CRC-8 over a payload that is not contiguous in memory.
///
/// The frame encoder checksums the opcode byte and the parameter slice it
/// receives separately; this wraps the crc crate's digest so the two pieces
/// can be folded in without first assembling them into one buffer.
pub struct Crc8Digest {
    digest: crc::Digest<'static, u8>,
}

impl Crc8Digest {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: CRC8.digest(),
        }
    }

    /// Fold one byte into the checksum.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.digest.update(&[byte]);
    }

    /// Fold a byte slice into the checksum.
    #[inline]
    pub fn update_slice(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    /// Consume the digest and return the checksum.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u8 {
        self.digest.finalize()
    }
}

impl Default for Crc8Digest {
    fn default() -> Self {
        Self::new()
    }
}
