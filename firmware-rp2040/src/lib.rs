//! RP2040 firmware for the hidlink serial-to-HID bridge.
//!
//! A host machine sends framed binary commands over UART0; the firmware
//! decodes, queues, and executes them, acting as a USB composite HID device
//! (boot keyboard + boot mouse) toward a second machine. A hardware panic
//! button aborts all queued and in-flight work at any time.
//!
//! # Hardware configuration
//!
//! | Function     | GPIO | Description                           |
//! |--------------|------|---------------------------------------|
//! | UART0 TX     | 0    | ACK bytes to the commanding host      |
//! | UART0 RX     | 1    | Framed commands in                    |
//! | UART1 TX     | 8    | Human-readable log channel            |
//! | Panic button | 15   | Pull-up, falling edge, 50 ms debounce |
//! | LED          | 25   | On-board LED (UART error indicator)   |
//!
//! # Architecture
//!
//! The command pipeline itself lives in `hidlink-core` and is synchronous
//! and non-blocking; the Embassy tasks around it only move bytes:
//!
//! - **Bridge task**: the main loop. Each 1 ms iteration services the
//!   interrupt flag, drains received bytes through the pipeline, and polls
//!   the executor and the timed-action slot.
//! - **UART RX / ACK TX / Log TX tasks**: pump the three serial channels.
//! - **HID task**: applies pipeline events to the keyboard/mouse report
//!   state and writes USB HID reports.
//! - **Button task**: the "ISR" context; debounces falling edges and raises
//!   the shared interrupt flag.
//! - **USB task**: runs the USB device stack.
//!
//! # Features
//!
//! - **`dev-panic`** (default): `panic-probe` (prints panic info via RTT)
//! - **`prod-panic`**: `panic-reset` for production

#![no_std]

// Ensure exactly one panic handler is selected
#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

pub mod hid;
pub mod io;
pub mod keymap;

pub use hid::{configure_usb_hid, HidEvent, KeyboardState, MouseState};
pub use io::{ChannelAckSink, ChannelHidDriver, ChannelLogSink};

/// Baud rate of the host command link (UART0).
pub const COMMAND_BAUD: u32 = 115_200;

/// Baud rate of the diagnostic log channel (UART1).
pub const LOG_BAUD: u32 = 115_200;
