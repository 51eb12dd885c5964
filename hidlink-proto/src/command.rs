//! Command model: opcodes, parameter arity, and the decoded in-memory form.
//!
//! A [`Command`] keeps the opcode as a raw byte on purpose: admission to the
//! execution queue does not validate opcodes, so unknown values must survive
//! until the executor inspects them. [`Opcode`] is the typed view the
//! executor (and the control-plane fast path) resolves on demand.

use crate::frame::MAX_PAYLOAD_LEN;

/// Maximum parameter length (payload minus the opcode byte).
pub const MAX_PARAMS_LEN: usize = MAX_PAYLOAD_LEN - 1;

/// Parameter bytes of a command.
pub type Params = heapless::Vec<u8, MAX_PARAMS_LEN>;

/// Wire opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    MouseMove = 0x01,
    MousePress = 0x02,
    MouseRelease = 0x03,
    MouseClick = 0x04,
    MousePressTimed = 0x05,
    KbPress = 0x10,
    KbRelease = 0x11,
    KbWrite = 0x12,
    KbReleaseAll = 0x13,
    KbPrint = 0x14,
    KbPressTimed = 0x15,
    PauseLog = 0x20,
    ResumeLog = 0x21,
    ClearQueue = 0x22,
}

impl Opcode {
    /// Decode a wire byte, or `None` for unknown opcodes.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::MouseMove,
            0x02 => Self::MousePress,
            0x03 => Self::MouseRelease,
            0x04 => Self::MouseClick,
            0x05 => Self::MousePressTimed,
            0x10 => Self::KbPress,
            0x11 => Self::KbRelease,
            0x12 => Self::KbWrite,
            0x13 => Self::KbReleaseAll,
            0x14 => Self::KbPrint,
            0x15 => Self::KbPressTimed,
            0x20 => Self::PauseLog,
            0x21 => Self::ResumeLog,
            0x22 => Self::ClearQueue,
            _ => return None,
        })
    }

    /// Control-plane opcodes execute synchronously in the receive path and
    /// never enter the queue.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::PauseLog | Self::ResumeLog | Self::ClearQueue)
    }

    /// Check a parameter length against this opcode's arity.
    #[must_use]
    pub const fn accepts_params(self, len: usize) -> bool {
        match self {
            Self::MouseMove | Self::MousePressTimed | Self::KbPressTimed => len == 3,
            Self::MousePress | Self::MouseRelease | Self::MouseClick => len == 1,
            Self::KbPress | Self::KbRelease | Self::KbWrite => len == 1,
            Self::KbReleaseAll | Self::PauseLog | Self::ResumeLog | Self::ClearQueue => len == 0,
            Self::KbPrint => len >= 1 && len <= MAX_PARAMS_LEN,
        }
    }

    /// Expected parameter count, for diagnostics. `KB_PRINT` is variadic and
    /// reports its minimum.
    #[must_use]
    pub const fn expected_params(self) -> usize {
        match self {
            Self::MouseMove | Self::MousePressTimed | Self::KbPressTimed => 3,
            Self::MousePress | Self::MouseRelease | Self::MouseClick => 1,
            Self::KbPress | Self::KbRelease | Self::KbWrite => 1,
            Self::KbReleaseAll | Self::PauseLog | Self::ResumeLog | Self::ClearQueue => 0,
            Self::KbPrint => 1,
        }
    }

    /// Human-readable opcode name for the log channel.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MouseMove => "MOUSE_MOVE",
            Self::MousePress => "MOUSE_PRESS",
            Self::MouseRelease => "MOUSE_RELEASE",
            Self::MouseClick => "MOUSE_CLICK",
            Self::MousePressTimed => "MOUSE_PRESS_TIMED",
            Self::KbPress => "KB_PRESS",
            Self::KbRelease => "KB_RELEASE",
            Self::KbWrite => "KB_WRITE",
            Self::KbReleaseAll => "KB_RELEASE_ALL",
            Self::KbPrint => "KB_PRINT",
            Self::KbPressTimed => "KB_PRESS_TIMED",
            Self::PauseLog => "PAUSE_LOG",
            Self::ResumeLog => "RESUME_LOG",
            Self::ClearQueue => "CLEAR_QUEUE",
        }
    }
}

/// A command as admitted to the queue: raw opcode plus parameter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Wire opcode byte. May not correspond to any [`Opcode`].
    pub opcode: u8,
    /// Parameter bytes following the opcode.
    pub params: Params,
}

impl Command {
    /// Split a CRC-validated payload into opcode and parameters.
    ///
    /// Returns `None` for an empty payload (the EMPTY_PAYLOAD error case).
    #[must_use]
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let (&opcode, params) = payload.split_first()?;
        // Payload length is bounded by the frame parser, so this fits.
        let params = Params::from_slice(params).ok()?;
        Some(Self { opcode, params })
    }

    /// The typed opcode, if this command carries a known one.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// Big-endian u16 duration for the `*_PRESS_TIMED` commands.
    ///
    /// Callers must have checked arity; returns 0 on short parameters.
    #[must_use]
    pub fn duration_ms(&self) -> u16 {
        match self.params.get(1..3) {
            Some(&[hi, lo]) => u16::from_be_bytes([hi, lo]),
            _ => 0,
        }
    }
}
