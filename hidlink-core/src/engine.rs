//! Pipeline glue: frame reception, dispatch, acknowledgement, and the
//! non-blocking main-loop step.
//!
//! The engine is clock-free: every entry point takes the current monotonic
//! millisecond counter, so the whole pipeline runs on the host under test
//! exactly as it runs on the target.

use hidlink_proto::{AckCode, Command, FrameError, FrameParser, Opcode, ParserEvent};

use crate::executor::Executor;
use crate::hid::{HidDriver, MouseButtons};
use crate::interrupt::InterruptFlag;
use crate::log::{LogSink, Logger, Verbosity};
use crate::queue::{CommandQueue, QUEUE_CAPACITY};
use crate::stats::{Stats, StatsReporter};

/// Outbound channel for single-byte acknowledgements.
///
/// Implementations must not block; transmission is queued and drained
/// outside the pipeline.
pub trait AckSink {
    fn send(&mut self, code: AckCode);
}

/// The command-processing pipeline.
///
/// Owns the frame parser, the bounded queue, the executor with its
/// timed-action slot, the traffic counters, and the three outward-facing
/// sinks. Driven from a single execution context:
///
/// 1. [`service_interrupt`](Self::service_interrupt) at the top of each
///    main-loop iteration,
/// 2. [`on_byte`](Self::on_byte) for every byte received on the command
///    link,
/// 3. [`poll`](Self::poll) once per iteration for timed-action completion,
///    one executor step, and the stats cadence.
///
/// No method blocks or waits.
pub struct Engine<H, A, L> {
    hid: H,
    acks: A,
    logger: Logger<L>,
    parser: FrameParser,
    queue: CommandQueue,
    executor: Executor,
    stats: Stats,
    reporter: StatsReporter,
}

impl<H: HidDriver, A: AckSink, L: LogSink> Engine<H, A, L> {
    /// Create an engine at `Debug` log verbosity.
    pub fn new(hid: H, acks: A, log_sink: L) -> Self {
        Self::with_verbosity(hid, acks, log_sink, Verbosity::Debug)
    }

    pub fn with_verbosity(hid: H, acks: A, log_sink: L, verbosity: Verbosity) -> Self {
        Self {
            hid,
            acks,
            logger: Logger::with_verbosity(log_sink, verbosity),
            parser: FrameParser::new(),
            queue: CommandQueue::new(),
            executor: Executor::new(),
            stats: Stats::new(),
            reporter: StatsReporter::new(),
        }
    }

    /// Emit the startup banner and ready line.
    pub fn startup(&mut self, now_ms: u32, version: &str) {
        self.logger.banner(now_ms, version);
        self.logger.sys(now_ms, format_args!("Ready for commands"));
    }

    /// Feed one byte from the command link.
    ///
    /// Completed frames are dispatched synchronously: control-plane opcodes
    /// execute here, data-plane opcodes are admitted to the queue. Every
    /// completed frame produces exactly one ACK byte; bytes before a SYNC
    /// produce nothing.
    pub fn on_byte(&mut self, byte: u8, now_ms: u32) {
        match self.parser.push_byte(byte) {
            None => {}
            Some(ParserEvent::FrameStarted { len }) => {
                self.stats.packets_total += 1;
                let packet_no = self.stats.packets_total;
                self.logger.recv_packet(now_ms, packet_no, len);
            }
            Some(ParserEvent::Frame(payload)) => self.dispatch(&payload, now_ms),
            Some(ParserEvent::Error(error)) => {
                self.stats.errors_total += 1;
                match error {
                    FrameError::InvalidLength { len } => {
                        self.logger.error(
                            now_ms,
                            "INVALID_LENGTH",
                            Some(format_args!("Got: {len}")),
                            self.stats.errors_total,
                        );
                        self.send_ack(now_ms, AckCode::ParamError);
                    }
                    FrameError::CrcMismatch { expected, received } => {
                        self.logger.error(
                            now_ms,
                            "CRC_MISMATCH",
                            Some(format_args!("Expected: 0x{expected:02X}, Got: 0x{received:02X}")),
                            self.stats.errors_total,
                        );
                        self.send_ack(now_ms, AckCode::CrcError);
                    }
                }
            }
        }
    }

    /// Service a pending hardware interrupt, if any. Call at the top of
    /// every main-loop iteration, before parsing or executing.
    ///
    /// Discards queued and in-flight work, forces release of all
    /// firmware-held HID state, and notifies the host with the unsolicited
    /// `ACK_INTERRUPTED`. Returns `true` when an interrupt was serviced.
    pub fn service_interrupt(&mut self, flag: &InterruptFlag, now_ms: u32) -> bool {
        if !flag.is_pending() {
            return false;
        }
        self.logger.interrupt(now_ms);
        self.queue.clear();
        self.hid.kb_release_all();
        self.hid.mouse_release(MouseButtons::ALL);
        self.executor.cancel_timed(&mut self.hid);
        self.send_ack(now_ms, AckCode::Interrupted);
        flag.clear();
        true
    }

    /// One non-blocking main-loop step: complete an expired timed hold,
    /// execute at most one queued command, and emit statistics on cadence.
    ///
    /// A queued command runs only while no timed action is active and no
    /// interrupt is pending. A step that just released a hold does not also
    /// start the next command; that happens on the following iteration.
    pub fn poll(&mut self, flag: &InterruptFlag, now_ms: u32) {
        let released = self
            .executor
            .poll_timed(now_ms, &mut self.hid, &mut self.logger);

        if !released && !self.executor.is_timed_active() && !flag.is_pending() {
            if let Some(entry) = self.queue.pop() {
                self.executor.execute(
                    entry,
                    &mut self.hid,
                    flag,
                    &mut self.logger,
                    &mut self.stats,
                    now_ms,
                );
            }
        }

        self.reporter.poll(
            now_ms,
            &mut self.stats,
            self.queue.len(),
            QUEUE_CAPACITY,
            &mut self.logger,
        );
    }

    fn dispatch(&mut self, payload: &[u8], now_ms: u32) {
        let Some(command) = Command::from_payload(payload) else {
            self.stats.errors_total += 1;
            self.logger
                .error(now_ms, "EMPTY_PACKET", None, self.stats.errors_total);
            self.send_ack(now_ms, AckCode::ParamError);
            return;
        };

        self.logger.frame_data(payload);

        match command.opcode() {
            Some(opcode) if opcode.is_control() => {
                self.run_control(opcode, now_ms);
                self.send_ack(now_ms, AckCode::Success);
            }
            // Data-plane commands, including unknown opcodes: admission does
            // not validate; the executor drops invalid commands later.
            _ => {
                if self.queue.admit(command, now_ms).is_ok() {
                    self.send_ack(now_ms, AckCode::Success);
                } else {
                    self.stats.errors_total += 1;
                    self.logger.error(
                        now_ms,
                        "QUEUE_FULL",
                        Some(format_args!("{QUEUE_CAPACITY} commands pending")),
                        self.stats.errors_total,
                    );
                    self.send_ack(now_ms, AckCode::ParamError);
                }
            }
        }
    }

    fn run_control(&mut self, opcode: Opcode, now_ms: u32) {
        match opcode {
            Opcode::PauseLog => self.logger.pause(now_ms),
            Opcode::ResumeLog => self.logger.resume(now_ms),
            Opcode::ClearQueue => {
                let discarded = self.queue.len();
                self.queue.clear();
                self.logger.exec(
                    now_ms,
                    "CLEAR_QUEUE",
                    Some(format_args!("{discarded} pending commands discarded")),
                );
            }
            _ => {}
        }
    }

    fn send_ack(&mut self, now_ms: u32, code: AckCode) {
        self.acks.send(code);
        if code == AckCode::Success {
            self.stats.acks_success += 1;
        }
        self.logger.ack(now_ms, code);
    }

    /// Whether the runtime logging flag is set.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logger.is_enabled()
    }

    /// Whether a timed hold is in flight.
    #[must_use]
    pub fn timed_active(&self) -> bool {
        self.executor.is_timed_active()
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }

    pub fn hid_mut(&mut self) -> &mut H {
        &mut self.hid
    }

    pub fn acks(&self) -> &A {
        &self.acks
    }

    pub fn logger(&self) -> &Logger<L> {
        &self.logger
    }

    /// Decompose the engine into its sinks.
    pub fn into_parts(self) -> (H, A, L) {
        (self.hid, self.acks, self.logger.into_sink())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::string::String;
    use std::vec::Vec;

    use hidlink_proto::encode_frame;

    use super::*;
    use crate::stats::STATS_INTERVAL_MS;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum HidCall {
        MouseMove(i8, i8, i8),
        MousePress(u8),
        MouseRelease(u8),
        MouseClick(u8),
        KbPress(u8),
        KbRelease(u8),
        KbWrite(u8),
        KbReleaseAll,
    }

    /// Records HID calls; optionally raises an interrupt flag after a
    /// configured number of key writes (the S6 scenario).
    struct MockHid<'a> {
        calls: Vec<HidCall>,
        raise_after_writes: Option<(usize, &'a InterruptFlag)>,
        writes: usize,
    }

    impl<'a> MockHid<'a> {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                raise_after_writes: None,
                writes: 0,
            }
        }

        fn raising_after(writes: usize, flag: &'a InterruptFlag) -> Self {
            Self {
                calls: Vec::new(),
                raise_after_writes: Some((writes, flag)),
                writes: 0,
            }
        }
    }

    impl HidDriver for MockHid<'_> {
        fn mouse_move(&mut self, x: i8, y: i8, wheel: i8) {
            self.calls.push(HidCall::MouseMove(x, y, wheel));
        }
        fn mouse_press(&mut self, buttons: MouseButtons) {
            self.calls.push(HidCall::MousePress(buttons.raw()));
        }
        fn mouse_release(&mut self, buttons: MouseButtons) {
            self.calls.push(HidCall::MouseRelease(buttons.raw()));
        }
        fn mouse_click(&mut self, buttons: MouseButtons) {
            self.calls.push(HidCall::MouseClick(buttons.raw()));
        }
        fn kb_press(&mut self, key: u8) {
            self.calls.push(HidCall::KbPress(key));
        }
        fn kb_release(&mut self, key: u8) {
            self.calls.push(HidCall::KbRelease(key));
        }
        fn kb_write(&mut self, key: u8) {
            self.calls.push(HidCall::KbWrite(key));
            self.writes += 1;
            if let Some((after, flag)) = self.raise_after_writes {
                if self.writes == after {
                    flag.raise();
                }
            }
        }
        fn kb_release_all(&mut self) {
            self.calls.push(HidCall::KbReleaseAll);
        }
    }

    #[derive(Default)]
    struct MockAcks {
        sent: Vec<u8>,
    }

    impl AckSink for MockAcks {
        fn send(&mut self, code: AckCode) {
            self.sent.push(code.as_byte());
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
    }

    impl LogSink for RecordingSink {
        fn write_line(&mut self, line: &str) {
            self.lines.push(String::from(line));
        }
    }

    type TestEngine<'a> = Engine<MockHid<'a>, MockAcks, RecordingSink>;

    fn engine<'a>() -> TestEngine<'a> {
        Engine::new(MockHid::new(), MockAcks::default(), RecordingSink::default())
    }

    fn feed_frame(engine: &mut TestEngine<'_>, opcode: u8, params: &[u8], now_ms: u32) {
        let mut buf = [0u8; 40];
        let n = encode_frame(opcode, params, &mut buf).unwrap();
        for &b in &buf[..n] {
            engine.on_byte(b, now_ms);
        }
    }

    #[test]
    fn test_valid_mouse_move_end_to_end() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        feed_frame(&mut engine, 0x01, &[0x05, 0xFB, 0x00], 0);
        assert_eq!(engine.acks().sent, [0xF0]);
        assert_eq!(engine.queue().len(), 1);

        engine.poll(&flag, 1);
        assert_eq!(engine.hid().calls, [HidCall::MouseMove(5, -5, 0)]);
        assert!(engine.queue().is_empty());

        // No further activity on subsequent polls.
        engine.poll(&flag, 2);
        assert_eq!(engine.hid().calls.len(), 1);
        assert_eq!(engine.acks().sent.len(), 1);
    }

    #[test]
    fn test_crc_corruption_is_rejected() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        let mut buf = [0u8; 16];
        let n = encode_frame(0x01, &[0x05, 0xFB, 0x00], &mut buf).unwrap();
        buf[n - 1] ^= 0xFF;
        for &b in &buf[..n] {
            engine.on_byte(b, 0);
        }

        assert_eq!(engine.acks().sent, [0xF1]);
        assert_eq!(engine.stats().errors_total, 1);
        engine.poll(&flag, 1);
        assert!(engine.hid().calls.is_empty());
    }

    #[test]
    fn test_queue_fill_and_overflow() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        // 16 clicks fill the queue, the 17th is refused.
        for i in 0..17u32 {
            feed_frame(&mut engine, 0x04, &[0x01], i);
        }
        let mut expected = [0xF0u8; 17];
        expected[16] = 0xF3;
        assert_eq!(engine.acks().sent, expected);
        assert_eq!(engine.queue().len(), QUEUE_CAPACITY);

        // Drain: exactly 16 clicks, in order, one per step.
        for i in 0..16u32 {
            engine.poll(&flag, 100 + i);
        }
        assert_eq!(engine.hid().calls.len(), 16);
        assert!(engine
            .hid()
            .calls
            .iter()
            .all(|c| *c == HidCall::MouseClick(0x01)));
        assert!(engine.queue().is_empty());

        engine.poll(&flag, 200);
        assert_eq!(engine.hid().calls.len(), 16);
    }

    #[test]
    fn test_timed_hold_cancelled_by_interrupt() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        // Hold 'A' (0x41) for 5000 ms.
        feed_frame(&mut engine, 0x15, &[0x41, 0x13, 0x88], 0);
        engine.poll(&flag, 0);
        assert!(engine.timed_active());
        assert_eq!(engine.hid().calls, [HidCall::KbPress(0x41)]);

        // Button pressed at t=100.
        flag.raise();
        assert!(engine.service_interrupt(&flag, 100));

        assert_eq!(engine.acks().sent.last(), Some(&0xF4));
        assert!(!engine.timed_active());
        assert!(engine.queue().is_empty());
        assert!(!flag.is_pending());
        assert_eq!(
            engine.hid().calls,
            [
                HidCall::KbPress(0x41),
                HidCall::KbReleaseAll,
                HidCall::MouseRelease(0x07),
                HidCall::KbRelease(0x41),
            ]
        );

        // The hold never completes later.
        engine.poll(&flag, 6000);
        assert_eq!(engine.hid().calls.len(), 4);
    }

    #[test]
    fn test_clear_queue_jumps_the_line() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        for _ in 0..5 {
            feed_frame(&mut engine, 0x01, &[0x01, 0x01, 0x00], 0);
        }
        assert_eq!(engine.queue().len(), 5);

        feed_frame(&mut engine, 0x22, &[], 1);
        assert_eq!(engine.acks().sent.last(), Some(&0xF0));
        assert!(engine.queue().is_empty());

        for t in 2..10 {
            engine.poll(&flag, t);
        }
        assert!(engine.hid().calls.is_empty());
    }

    #[test]
    fn test_kb_print_stops_mid_stream_on_interrupt() {
        let flag = InterruptFlag::new();
        let mut engine: TestEngine<'_> = Engine::new(
            MockHid::raising_after(5, &flag),
            MockAcks::default(),
            RecordingSink::default(),
        );

        let text = [b'x'; 30];
        feed_frame(&mut engine, 0x14, &text, 0);
        engine.poll(&flag, 1);

        // Writes 6..30 never happen.
        let writes = engine
            .hid()
            .calls
            .iter()
            .filter(|c| matches!(c, HidCall::KbWrite(_)))
            .count();
        assert_eq!(writes, 5);

        // Next iteration services the interrupt exactly once.
        assert!(engine.service_interrupt(&flag, 2));
        let interrupted_acks = engine.acks().sent.iter().filter(|&&a| a == 0xF4).count();
        assert_eq!(interrupted_acks, 1);
        assert!(engine.hid().calls.contains(&HidCall::KbReleaseAll));
        assert!(!engine.service_interrupt(&flag, 3));
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let mut engine = engine();

        feed_frame(&mut engine, 0x20, &[], 0);
        assert!(!engine.logging_enabled());
        // Repeated PAUSE_LOG is idempotent.
        feed_frame(&mut engine, 0x20, &[], 1);
        assert!(!engine.logging_enabled());
        feed_frame(&mut engine, 0x21, &[], 2);
        assert!(engine.logging_enabled());
        assert_eq!(engine.acks().sent, [0xF0, 0xF0, 0xF0]);
    }

    #[test]
    fn test_clear_queue_on_empty_is_noop() {
        let mut engine = engine();
        feed_frame(&mut engine, 0x22, &[], 0);
        assert_eq!(engine.acks().sent, [0xF0]);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn test_one_ack_per_frame() {
        let mut engine = engine();

        // Garbage produces nothing.
        for b in [0x00u8, 0x13, 0x37, 0xFF] {
            engine.on_byte(b, 0);
        }
        assert!(engine.acks().sent.is_empty());

        // Valid frame: one ACK.
        feed_frame(&mut engine, 0x13, &[], 1);
        // Invalid length: one ACK.
        engine.on_byte(0xAA, 2);
        engine.on_byte(0x00, 2);
        // Oversized length: one ACK.
        engine.on_byte(0xAA, 3);
        engine.on_byte(32, 3);

        assert_eq!(engine.acks().sent, [0xF0, 0xF3, 0xF3]);
    }

    #[test]
    fn test_unknown_opcode_admitted_then_dropped() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        feed_frame(&mut engine, 0x7F, &[0x01], 0);
        // ACK describes frame reception, not execution outcome.
        assert_eq!(engine.acks().sent, [0xF0]);
        assert_eq!(engine.queue().len(), 1);

        engine.poll(&flag, 1);
        assert!(engine.hid().calls.is_empty());
        assert_eq!(engine.stats().errors_total, 1);
        // No retroactive ACK.
        assert_eq!(engine.acks().sent.len(), 1);
    }

    #[test]
    fn test_executor_waits_for_timed_hold() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        // Hold LEFT for 1000 ms, then a click queued behind it.
        feed_frame(&mut engine, 0x05, &[0x01, 0x03, 0xE8], 0);
        feed_frame(&mut engine, 0x04, &[0x01], 0);

        engine.poll(&flag, 0);
        assert!(engine.timed_active());
        assert_eq!(engine.hid().calls, [HidCall::MousePress(0x01)]);

        // While the hold is active the click must not run.
        engine.poll(&flag, 500);
        assert_eq!(engine.hid().calls.len(), 1);

        // Deadline passes: release first, then the click on a later step.
        engine.poll(&flag, 1000);
        assert_eq!(
            engine.hid().calls,
            [HidCall::MousePress(0x01), HidCall::MouseRelease(0x01)]
        );
        engine.poll(&flag, 1001);
        assert_eq!(engine.hid().calls.last(), Some(&HidCall::MouseClick(0x01)));
    }

    #[test]
    fn test_pending_interrupt_blocks_execution() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        feed_frame(&mut engine, 0x04, &[0x01], 0);
        flag.raise();
        engine.poll(&flag, 1);
        assert!(engine.hid().calls.is_empty());

        // Service discards the queued click entirely.
        engine.service_interrupt(&flag, 2);
        engine.poll(&flag, 3);
        assert!(!engine.hid().calls.contains(&HidCall::MouseClick(0x01)));
    }

    #[test]
    fn test_service_interrupt_without_pending_flag() {
        let flag = InterruptFlag::new();
        let mut engine = engine();
        assert!(!engine.service_interrupt(&flag, 0));
        assert!(engine.acks().sent.is_empty());
        assert!(engine.hid().calls.is_empty());
    }

    #[test]
    fn test_stats_emitted_on_cadence_and_reset() {
        let flag = InterruptFlag::new();
        let mut engine = engine();

        feed_frame(&mut engine, 0x13, &[], 0);
        assert_eq!(engine.stats().packets_total, 1);

        engine.poll(&flag, STATS_INTERVAL_MS);
        assert!(engine
            .logger()
            .sink()
            .lines
            .iter()
            .any(|l| l == "--- Statistics ---"));
        assert_eq!(engine.stats().packets_total, 0);
        assert_eq!(engine.stats().acks_success, 0);
    }

    #[test]
    fn test_control_plane_runs_while_queue_full() {
        let mut engine = engine();

        for _ in 0..QUEUE_CAPACITY {
            feed_frame(&mut engine, 0x04, &[0x01], 0);
        }
        assert!(engine.queue().is_full());

        // CLEAR_QUEUE is never refused by a full queue.
        feed_frame(&mut engine, 0x22, &[], 1);
        assert_eq!(engine.acks().sent.last(), Some(&0xF0));
        assert!(engine.queue().is_empty());
    }
}
