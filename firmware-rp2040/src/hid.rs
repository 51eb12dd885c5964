//! USB composite HID device: boot keyboard + boot mouse.
//!
//! The pipeline submits [`HidEvent`]s; the HID task applies them to the
//! report state kept here and writes the resulting reports to the two HID
//! interfaces.

use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::hid::{Config as HidConfig, HidBootProtocol, HidSubclass, HidWriter, State};
use embassy_usb::Builder;

use crate::keymap::{translate, KeyAction};

/// Keyboard report size: modifier, reserved, 6-key roster.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Mouse report size: buttons, x, y, wheel.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// LEFT_SHIFT bit in the modifier byte.
const LEFT_SHIFT: u8 = 0x02;

/// One HID operation requested by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum HidEvent {
    MouseMove { x: i8, y: i8, wheel: i8 },
    MousePress(u8),
    MouseRelease(u8),
    MouseClick(u8),
    KbPress(u8),
    KbRelease(u8),
    KbWrite(u8),
    KbReleaseAll,
}

/// Boot-protocol keyboard report state.
///
/// Tracks the modifier byte and the 6-slot key roster. A seventh
/// simultaneous key is dropped, matching boot-protocol behavior.
#[derive(Default)]
pub struct KeyboardState {
    modifier: u8,
    keycodes: [u8; 6],
}

impl KeyboardState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modifier: 0,
            keycodes: [0; 6],
        }
    }

    /// Hold a host key code. Returns the updated report, or `None` for
    /// unmapped codes.
    pub fn press(&mut self, key: u8) -> Option<[u8; KEYBOARD_REPORT_SIZE]> {
        match translate(key)? {
            KeyAction::Modifier(bit) => self.modifier |= bit,
            KeyAction::Usage(usage) => self.add_key(usage),
            KeyAction::ShiftedUsage(usage) => {
                self.modifier |= LEFT_SHIFT;
                self.add_key(usage);
            }
        }
        Some(self.report())
    }

    /// Release a host key code. Returns the updated report, or `None` for
    /// unmapped codes.
    pub fn release(&mut self, key: u8) -> Option<[u8; KEYBOARD_REPORT_SIZE]> {
        match translate(key)? {
            KeyAction::Modifier(bit) => self.modifier &= !bit,
            KeyAction::Usage(usage) => self.remove_key(usage),
            KeyAction::ShiftedUsage(usage) => {
                self.modifier &= !LEFT_SHIFT;
                self.remove_key(usage);
            }
        }
        Some(self.report())
    }

    /// Release every key and modifier. Returns the all-clear report.
    pub fn release_all(&mut self) -> [u8; KEYBOARD_REPORT_SIZE] {
        *self = Self::new();
        self.report()
    }

    fn add_key(&mut self, usage: u8) {
        if usage == 0 || self.keycodes.contains(&usage) {
            return;
        }
        if let Some(slot) = self.keycodes.iter_mut().find(|k| **k == 0) {
            *slot = usage;
        }
    }

    fn remove_key(&mut self, usage: u8) {
        for slot in &mut self.keycodes {
            if *slot == usage {
                *slot = 0;
            }
        }
    }

    fn report(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let k = &self.keycodes;
        [self.modifier, 0, k[0], k[1], k[2], k[3], k[4], k[5]]
    }
}

/// Boot-protocol mouse report state. Buttons are sticky; motion is per-report.
#[derive(Default)]
pub struct MouseState {
    buttons: u8,
}

impl MouseState {
    #[must_use]
    pub const fn new() -> Self {
        Self { buttons: 0 }
    }

    pub fn move_report(&self, x: i8, y: i8, wheel: i8) -> [u8; MOUSE_REPORT_SIZE] {
        [self.buttons, x as u8, y as u8, wheel as u8]
    }

    pub fn press(&mut self, mask: u8) -> [u8; MOUSE_REPORT_SIZE] {
        self.buttons |= mask & 0x07;
        self.move_report(0, 0, 0)
    }

    pub fn release(&mut self, mask: u8) -> [u8; MOUSE_REPORT_SIZE] {
        self.buttons &= !(mask & 0x07);
        self.move_report(0, 0, 0)
    }
}

/// Boot keyboard report descriptor: 8 modifier bits, reserved byte, 5 LED
/// outputs, 6-key roster.
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Modifier keys (8 bits) ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Reserved byte ---
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    //
    // --- LED output (5 bits + 3 padding) ---
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    //
    // --- Key roster (6 bytes) ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    //
    0xC0, // End Collection
];

/// Boot mouse report descriptor: 3 buttons, relative X/Y, wheel.
pub const MOUSE_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    //
    // --- Buttons (3 bits + 5 padding) ---
    0x05, 0x09, //     Usage Page (Buttons)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x03, //     Usage Maximum (Button 3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x01, //     Input (Constant)
    //
    // --- X, Y displacement ---
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    //
    // --- Scroll wheel ---
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    //
    0xC0, //   End Collection (Physical)
    0xC0, // End Collection (Application)
];

/// Writer for the keyboard interface.
pub type KeyboardWriter = HidWriter<'static, Driver<'static, USB>, KEYBOARD_REPORT_SIZE>;

/// Writer for the mouse interface.
pub type MouseWriter = HidWriter<'static, Driver<'static, USB>, MOUSE_REPORT_SIZE>;

/// Add the two HID interfaces to the USB builder.
///
/// Returns the writers for the HID task.
pub fn configure_usb_hid(
    builder: &mut Builder<'static, Driver<'static, USB>>,
    keyboard_state: &'static mut State<'static>,
    mouse_state: &'static mut State<'static>,
) -> (KeyboardWriter, MouseWriter) {
    let keyboard_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: KEYBOARD_REPORT_SIZE as u16,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Keyboard,
    };
    let keyboard = HidWriter::new(builder, keyboard_state, keyboard_config);

    let mouse_config = HidConfig {
        report_descriptor: MOUSE_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: MOUSE_REPORT_SIZE as u16,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Mouse,
    };
    let mouse = HidWriter::new(builder, mouse_state, mouse_config);

    (keyboard, mouse)
}
