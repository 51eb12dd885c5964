//! Diagnostic log channel.
//!
//! Logging is best-effort and side-effect-only: sinks are infallible and a
//! line that overflows the formatting buffer is truncated, never dropped
//! with an error. The runtime `enabled` flag (PAUSE_LOG/RESUME_LOG) gates
//! everything except the interrupt notification and the two log-state
//! messages themselves, which are contractually unconditional.

use core::fmt::{self, Write as _};

use hidlink_proto::AckCode;

/// Formatting capacity for one log line.
pub const MAX_LOG_LINE: usize = 160;

/// Unidirectional text channel for human-readable diagnostics.
pub trait LogSink {
    /// Emit one line (no trailing newline). Must not block.
    fn write_line(&mut self, line: &str);
}

/// How chatty the logger is. `Debug` adds the per-frame RECV/data/ACK lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verbosity {
    Info,
    Debug,
}

/// Formats pipeline events into `[<ms>ms] [<LEVEL>] ...` lines.
pub struct Logger<L> {
    sink: L,
    enabled: bool,
    verbosity: Verbosity,
}

impl<L: LogSink> Logger<L> {
    /// Create a logger at `Debug` verbosity with logging enabled.
    pub fn new(sink: L) -> Self {
        Self::with_verbosity(sink, Verbosity::Debug)
    }

    pub fn with_verbosity(sink: L, verbosity: Verbosity) -> Self {
        Self {
            sink,
            enabled: true,
            verbosity,
        }
    }

    /// Whether the runtime logging flag is set.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disable logging. The state-change line itself is unconditional.
    pub fn pause(&mut self, now_ms: u32) {
        self.enabled = false;
        self.line_forced("SYS", now_ms, format_args!("Logging paused"));
    }

    /// Re-enable logging. Idempotent; the state-change line is unconditional.
    pub fn resume(&mut self, now_ms: u32) {
        self.enabled = true;
        self.line_forced("SYS", now_ms, format_args!("Logging resumed"));
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut L {
        &mut self.sink
    }

    pub fn into_sink(self) -> L {
        self.sink
    }

    /// Startup banner.
    pub fn banner(&mut self, now_ms: u32, version: &str) {
        self.plain(format_args!("=================================="));
        self.plain(format_args!("Serial HID Bridge Started"));
        self.plain(format_args!("Firmware Version: {version} | Time: {now_ms}"));
        self.plain(format_args!("=================================="));
    }

    /// General system event (startup, queue clears, ...).
    pub fn sys(&mut self, now_ms: u32, args: fmt::Arguments<'_>) {
        self.line("SYS", now_ms, args);
    }

    /// Frame header accepted (debug).
    pub fn recv_packet(&mut self, now_ms: u32, packet_no: u32, len: u8) {
        if self.verbosity < Verbosity::Debug {
            return;
        }
        self.line(
            "RECV",
            now_ms,
            format_args!("Packet #{packet_no} | Length: {len}"),
        );
    }

    /// Hex dump of an accepted payload (debug).
    pub fn frame_data(&mut self, payload: &[u8]) {
        if !self.enabled || self.verbosity < Verbosity::Debug {
            return;
        }
        let mut line: heapless::String<MAX_LOG_LINE> = heapless::String::new();
        let _ = line.push_str("    Data:");
        for &b in payload {
            let _ = write!(line, " {b:02X}");
        }
        self.sink.write_line(&line);
    }

    /// Command execution event, optionally with a detail clause.
    pub fn exec(&mut self, now_ms: u32, name: &str, details: Option<fmt::Arguments<'_>>) {
        match details {
            Some(details) => self.line("EXEC", now_ms, format_args!("{name} | {details}")),
            None => self.line("EXEC", now_ms, format_args!("{name}")),
        }
    }

    /// Printable/escaped dump of a KB_PRINT text, capped at 40 characters.
    pub fn kb_print_text(&mut self, text: &[u8]) {
        if !self.enabled {
            return;
        }
        let mut line: heapless::String<MAX_LOG_LINE> = heapless::String::new();
        let _ = line.push_str("    Text: \"");
        for &b in text.iter().take(40) {
            if (0x20..=0x7E).contains(&b) {
                let _ = line.push(b as char);
            } else {
                let _ = write!(line, "\\x{b:02X}");
            }
        }
        if text.len() > 40 {
            let _ = line.push_str("...");
        }
        let _ = line.push('"');
        self.sink.write_line(&line);
    }

    /// Pipeline error with the running error total.
    pub fn error(
        &mut self,
        now_ms: u32,
        kind: &str,
        details: Option<fmt::Arguments<'_>>,
        total_errors: u32,
    ) {
        match details {
            Some(details) => self.line(
                "ERROR",
                now_ms,
                format_args!("{kind} | {details} | Total Errors: {total_errors}"),
            ),
            None => self.line(
                "ERROR",
                now_ms,
                format_args!("{kind} | Total Errors: {total_errors}"),
            ),
        }
    }

    /// ACK byte sent to the host (debug).
    pub fn ack(&mut self, now_ms: u32, code: AckCode) {
        if self.verbosity < Verbosity::Debug {
            return;
        }
        self.line(
            "ACK",
            now_ms,
            format_args!("{} (0x{:02X})", code.name(), code.as_byte()),
        );
    }

    /// Hardware safety stop serviced. Unconditional.
    pub fn interrupt(&mut self, now_ms: u32) {
        self.line_forced(
            "INT",
            now_ms,
            format_args!("Hardware interrupt | queue cleared, HID state released"),
        );
    }

    /// Unprefixed line (stats block, banner). Gated by the enabled flag.
    pub fn plain(&mut self, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        self.write(args);
    }

    fn line(&mut self, level: &str, now_ms: u32, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        self.prefixed(level, now_ms, args);
    }

    fn line_forced(&mut self, level: &str, now_ms: u32, args: fmt::Arguments<'_>) {
        self.prefixed(level, now_ms, args);
    }

    fn prefixed(&mut self, level: &str, now_ms: u32, args: fmt::Arguments<'_>) {
        let mut line: heapless::String<MAX_LOG_LINE> = heapless::String::new();
        let _ = write!(line, "[{now_ms}ms] [{level}] ");
        let _ = line.write_fmt(args);
        self.sink.write_line(&line);
    }

    fn write(&mut self, args: fmt::Arguments<'_>) {
        let mut line: heapless::String<MAX_LOG_LINE> = heapless::String::new();
        let _ = line.write_fmt(args);
        self.sink.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::String;
    use std::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
    }

    impl LogSink for RecordingSink {
        fn write_line(&mut self, line: &str) {
            self.lines.push(String::from(line));
        }
    }

    #[test]
    fn test_line_prefix_format() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.exec(1234, "MOUSE_MOVE", Some(format_args!("x=5, y=-5, wheel=0")));
        assert_eq!(
            logger.sink().lines,
            ["[1234ms] [EXEC] MOUSE_MOVE | x=5, y=-5, wheel=0"]
        );
    }

    #[test]
    fn test_pause_suppresses_but_announces() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.pause(10);
        logger.exec(20, "MOUSE_CLICK", None);
        logger.error(30, "QUEUE_FULL", None, 1);
        logger.resume(40);
        logger.exec(50, "MOUSE_CLICK", None);

        assert_eq!(
            logger.sink().lines,
            [
                "[10ms] [SYS] Logging paused",
                "[40ms] [SYS] Logging resumed",
                "[50ms] [EXEC] MOUSE_CLICK",
            ]
        );
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.pause(1);
        logger.pause(2);
        logger.resume(3);
        assert!(logger.is_enabled());
        assert_eq!(logger.sink().lines.len(), 3);
    }

    #[test]
    fn test_interrupt_bypasses_pause() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.pause(0);
        logger.interrupt(99);
        assert_eq!(
            logger.sink().lines.last().unwrap(),
            "[99ms] [INT] Hardware interrupt | queue cleared, HID state released"
        );
    }

    #[test]
    fn test_info_verbosity_drops_debug_lines() {
        let mut logger = Logger::with_verbosity(RecordingSink::default(), Verbosity::Info);
        logger.recv_packet(0, 1, 4);
        logger.frame_data(&[0x01, 0x02]);
        logger.ack(0, AckCode::Success);
        assert!(logger.sink().lines.is_empty());

        logger.exec(0, "KB_PRESS", None);
        assert_eq!(logger.sink().lines.len(), 1);
    }

    #[test]
    fn test_frame_data_hex_dump() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.frame_data(&[0x01, 0x05, 0xFB, 0x00]);
        assert_eq!(logger.sink().lines, ["    Data: 01 05 FB 00"]);
    }

    #[test]
    fn test_ack_line_names_code() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.ack(7, AckCode::CrcError);
        assert_eq!(logger.sink().lines, ["[7ms] [ACK] CRC_ERROR (0xF1)"]);
    }

    #[test]
    fn test_kb_print_text_escapes_and_caps() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.kb_print_text(b"hi\x0Athere");
        assert_eq!(logger.sink().lines, ["    Text: \"hi\\x0Athere\""]);

        logger.sink_mut().lines.clear();
        let long = [b'x'; 45];
        logger.kb_print_text(&long);
        let line = &logger.sink().lines[0];
        assert!(line.ends_with("...\""));
        assert!(line.contains(&"x".repeat(40)));
        assert!(!line.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_error_line_carries_total() {
        let mut logger = Logger::new(RecordingSink::default());
        logger.error(
            5,
            "CRC_MISMATCH",
            Some(format_args!("Expected: 0x12, Got: 0x21")),
            3,
        );
        assert_eq!(
            logger.sink().lines,
            ["[5ms] [ERROR] CRC_MISMATCH | Expected: 0x12, Got: 0x21 | Total Errors: 3"]
        );
    }
}
