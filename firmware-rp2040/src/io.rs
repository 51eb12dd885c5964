//! Channel-backed sink adapters.
//!
//! The pipeline runs synchronously inside the bridge task and must never
//! block, so its three outward channels (HID events, ACK bytes, log lines)
//! are non-blocking `try_send`s into Embassy channels drained by dedicated
//! tasks. A full channel drops the item: ACK and log delivery are
//! best-effort by contract, and a full HID channel means the USB host has
//! stopped polling.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use defmt::warn;
use hidlink_core::{AckSink, HidDriver, LogSink, MouseButtons, MAX_LOG_LINE};
use hidlink_proto::AckCode;

use crate::hid::HidEvent;

pub const RX_QUEUE_DEPTH: usize = 64;
pub const ACK_QUEUE_DEPTH: usize = 16;
pub const LOG_QUEUE_DEPTH: usize = 8;
pub const HID_QUEUE_DEPTH: usize = 32;

/// Bytes from the command UART to the bridge task.
pub type RxChannel = Channel<CriticalSectionRawMutex, u8, RX_QUEUE_DEPTH>;

/// ACK bytes from the bridge task to the command UART.
pub type AckChannel = Channel<CriticalSectionRawMutex, u8, ACK_QUEUE_DEPTH>;

/// One formatted log line.
pub type LogLine = heapless::String<MAX_LOG_LINE>;

/// Log lines from the bridge task to the log UART.
pub type LogChannel = Channel<CriticalSectionRawMutex, LogLine, LOG_QUEUE_DEPTH>;

/// HID events from the bridge task to the USB HID task.
pub type HidChannel = Channel<CriticalSectionRawMutex, HidEvent, HID_QUEUE_DEPTH>;

/// [`AckSink`] writing into the ACK channel.
pub struct ChannelAckSink {
    channel: &'static AckChannel,
}

impl ChannelAckSink {
    #[must_use]
    pub fn new(channel: &'static AckChannel) -> Self {
        Self { channel }
    }
}

impl AckSink for ChannelAckSink {
    fn send(&mut self, code: AckCode) {
        if self.channel.try_send(code.as_byte()).is_err() {
            warn!("ACK channel full, dropping {:?}", code);
        }
    }
}

/// [`LogSink`] writing into the log channel.
pub struct ChannelLogSink {
    channel: &'static LogChannel,
}

impl ChannelLogSink {
    #[must_use]
    pub fn new(channel: &'static LogChannel) -> Self {
        Self { channel }
    }
}

impl LogSink for ChannelLogSink {
    fn write_line(&mut self, line: &str) {
        let mut owned = LogLine::new();
        let _ = owned.push_str(line);
        // Dropping a log line is fine; blocking the pipeline is not.
        let _ = self.channel.try_send(owned);
    }
}

/// [`HidDriver`] submitting events into the HID channel.
pub struct ChannelHidDriver {
    channel: &'static HidChannel,
}

impl ChannelHidDriver {
    #[must_use]
    pub fn new(channel: &'static HidChannel) -> Self {
        Self { channel }
    }

    fn submit(&self, event: HidEvent) {
        if self.channel.try_send(event).is_err() {
            warn!("HID channel full, dropping {:?}", event);
        }
    }
}

impl HidDriver for ChannelHidDriver {
    fn mouse_move(&mut self, x: i8, y: i8, wheel: i8) {
        self.submit(HidEvent::MouseMove { x, y, wheel });
    }

    fn mouse_press(&mut self, buttons: MouseButtons) {
        self.submit(HidEvent::MousePress(buttons.raw()));
    }

    fn mouse_release(&mut self, buttons: MouseButtons) {
        self.submit(HidEvent::MouseRelease(buttons.raw()));
    }

    fn mouse_click(&mut self, buttons: MouseButtons) {
        self.submit(HidEvent::MouseClick(buttons.raw()));
    }

    fn kb_press(&mut self, key: u8) {
        self.submit(HidEvent::KbPress(key));
    }

    fn kb_release(&mut self, key: u8) {
        self.submit(HidEvent::KbRelease(key));
    }

    fn kb_write(&mut self, key: u8) {
        self.submit(HidEvent::KbWrite(key));
    }

    fn kb_release_all(&mut self) {
        self.submit(HidEvent::KbReleaseAll);
    }
}
