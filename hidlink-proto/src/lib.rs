//! Wire protocol for the hidlink serial-to-HID bridge.
//!
//! A host machine drives the bridge over a byte-serial link using small
//! binary frames; the firmware answers each completed frame with a
//! single-byte acknowledgement.
//!
//! # Frame format
//!
//! ```text
//! SYNC (0xAA) | LEN (1..=31) | PAYLOAD[LEN] | CRC-8
//! ```
//!
//! The CRC-8 (MAXIM-DOW, table-driven) covers the payload only. The payload
//! is an opcode byte followed by its parameters; multi-byte integers are
//! big-endian.
//!
//! # Modules
//!
//! - [`frame`]: the resumable three-state frame parser ([`FrameParser`]) and
//!   the host-side encoder ([`encode_frame`])
//! - [`command`]: opcode table, arity checks, and the decoded [`Command`]
//! - [`ack`]: acknowledgement byte codes ([`AckCode`])
//! - [`crc`]: CRC-8 checksum ([`crc8`], [`Crc8Digest`])
//!
//! # Features
//!
//! - **`std`**: standard library support (host testing)
//! - **`defmt`**: defmt formatting for embedded logging
//!
//! # No-std support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod ack;
pub mod command;
pub mod crc;
pub mod frame;

// Re-export main types at crate root
pub use ack::AckCode;
pub use command::{Command, Opcode, Params, MAX_PARAMS_LEN};
pub use crc::{crc8, Crc8Digest};
pub use frame::{
    encode_frame, EncodeError, FrameError, FrameParser, ParserEvent, Payload, MAX_PACKET_SIZE,
    MAX_PAYLOAD_LEN, SYNC,
};
