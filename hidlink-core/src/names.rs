//! Key and button name tables for the log channel.
//!
//! Informative only: nothing in the pipeline depends on these strings.

use core::fmt;

/// Name of a special key code, or `None` for codes without one.
#[must_use]
pub fn key_name(key: u8) -> Option<&'static str> {
    Some(match key {
        // Modifiers
        0x80 => "LEFT_CTRL",
        0x81 => "LEFT_SHIFT",
        0x82 => "LEFT_ALT",
        0x83 => "LEFT_GUI",
        0x84 => "RIGHT_CTRL",
        0x85 => "RIGHT_SHIFT",
        0x86 => "RIGHT_ALT",
        0x87 => "RIGHT_GUI",

        // Arrows
        0xDA => "UP_ARROW",
        0xD9 => "DOWN_ARROW",
        0xD8 => "LEFT_ARROW",
        0xD7 => "RIGHT_ARROW",

        // Editing / navigation
        0xB2 => "BACKSPACE",
        0xB3 => "TAB",
        0xB0 => "RETURN",
        0xB1 => "ESC",
        0xD4 => "DELETE",
        0xD3 => "PAGE_UP",
        0xD6 => "PAGE_DOWN",
        0xD2 => "HOME",
        0xD5 => "END",
        0xD1 => "INSERT",

        // Function keys
        0xC2 => "F1",
        0xC3 => "F2",
        0xC4 => "F3",
        0xC5 => "F4",
        0xC6 => "F5",
        0xC7 => "F6",
        0xC8 => "F7",
        0xC9 => "F8",
        0xCA => "F9",
        0xCB => "F10",
        0xCC => "F11",
        0xCD => "F12",

        0x20 => "SPACE",
        _ => return None,
    })
}

/// Name of a mouse button mask.
#[must_use]
pub fn button_name(mask: u8) -> &'static str {
    match mask {
        0x01 => "LEFT",
        0x02 => "RIGHT",
        0x04 => "MIDDLE",
        0x07 => "ALL",
        _ => "UNKNOWN",
    }
}

/// Display adapter for a key code: named specials, printable ASCII as the
/// character itself, anything else as `UNKNOWN`.
pub struct KeyLabel(pub u8);

impl fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match key_name(self.0) {
            Some(name) => f.write_str(name),
            None if (0x20..=0x7E).contains(&self.0) => write!(f, "{}", self.0 as char),
            None => f.write_str("UNKNOWN"),
        }
    }
}
