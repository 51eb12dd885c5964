//! Host key-code space to USB HID usage translation.
//!
//! The commanding host speaks the classic layout-mapped code space:
//! printable ASCII for characters (an implicit Shift where the US layout
//! needs one), `0x80..=0x87` for modifiers, and usage-plus-0x88 for the
//! remaining specials (arrows, function keys, editing keys).

/// High bit in [`ASCII_MAP`] entries: the usage requires Shift.
const SHIFT: u8 = 0x80;

/// First modifier code (LEFT_CTRL).
const MODIFIER_BASE: u8 = 0x80;

/// First raw-usage special code; `code - 0x88` is the HID usage.
const RAW_USAGE_BASE: u8 = 0x88;

/// What a key code means for the boot keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum KeyAction {
    /// A bit in the modifier byte (bit 0 = LEFT_CTRL .. bit 7 = RIGHT_GUI).
    Modifier(u8),
    /// A plain usage code for the key roster.
    Usage(u8),
    /// A usage code that also needs LEFT_SHIFT held.
    ShiftedUsage(u8),
}

/// Translate a host key code. Returns `None` for codes with no mapping
/// (unmapped control characters); those are silently ignored.
#[must_use]
pub fn translate(key: u8) -> Option<KeyAction> {
    if (MODIFIER_BASE..RAW_USAGE_BASE).contains(&key) {
        return Some(KeyAction::Modifier(1 << (key - MODIFIER_BASE)));
    }
    if key >= RAW_USAGE_BASE {
        return Some(KeyAction::Usage(key - RAW_USAGE_BASE));
    }
    match ASCII_MAP[key as usize] {
        0 => None,
        m if m & SHIFT != 0 => Some(KeyAction::ShiftedUsage(m & !SHIFT)),
        m => Some(KeyAction::Usage(m)),
    }
}

/// US-layout ASCII to HID usage map. High bit set means Shift is required.
#[rustfmt::skip]
const ASCII_MAP: [u8; 128] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // NUL..BEL
    0x2A,                                           // BS
    0x2B,                                           // TAB
    0x28,                                           // LF
    0x00, 0x00, 0x00, 0x00, 0x00,                   // VT..SI
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // DLE..ETB
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // CAN..US
    0x2C,                                           // ' '
    0x1E | SHIFT,                                   // !
    0x34 | SHIFT,                                   // "
    0x20 | SHIFT,                                   // #
    0x21 | SHIFT,                                   // $
    0x22 | SHIFT,                                   // %
    0x24 | SHIFT,                                   // &
    0x34,                                           // '
    0x26 | SHIFT,                                   // (
    0x27 | SHIFT,                                   // )
    0x25 | SHIFT,                                   // *
    0x2E | SHIFT,                                   // +
    0x36,                                           // ,
    0x2D,                                           // -
    0x37,                                           // .
    0x38,                                           // /
    0x27,                                           // 0
    0x1E, 0x1F, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, // 1..8
    0x26,                                           // 9
    0x33 | SHIFT,                                   // :
    0x33,                                           // ;
    0x36 | SHIFT,                                   // <
    0x2E,                                           // =
    0x37 | SHIFT,                                   // >
    0x38 | SHIFT,                                   // ?
    0x1F | SHIFT,                                   // @
    0x04 | SHIFT, 0x05 | SHIFT, 0x06 | SHIFT, 0x07 | SHIFT, // A..D
    0x08 | SHIFT, 0x09 | SHIFT, 0x0A | SHIFT, 0x0B | SHIFT, // E..H
    0x0C | SHIFT, 0x0D | SHIFT, 0x0E | SHIFT, 0x0F | SHIFT, // I..L
    0x10 | SHIFT, 0x11 | SHIFT, 0x12 | SHIFT, 0x13 | SHIFT, // M..P
    0x14 | SHIFT, 0x15 | SHIFT, 0x16 | SHIFT, 0x17 | SHIFT, // Q..T
    0x18 | SHIFT, 0x19 | SHIFT, 0x1A | SHIFT, 0x1B | SHIFT, // U..X
    0x1C | SHIFT, 0x1D | SHIFT,                             // Y..Z
    0x2F,                                           // [
    0x31,                                           // backslash
    0x30,                                           // ]
    0x23 | SHIFT,                                   // ^
    0x2D | SHIFT,                                   // _
    0x35,                                           // `
    0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, // a..h
    0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13, // i..p
    0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, // q..x
    0x1C, 0x1D,                                     // y..z
    0x2F | SHIFT,                                   // {
    0x31 | SHIFT,                                   // |
    0x30 | SHIFT,                                   // }
    0x35 | SHIFT,                                   // ~
    0x00,                                           // DEL
];
