//! Command executor and the single in-flight timed-action slot.
//!
//! The executor never blocks: a "hold for N ms" command presses the target
//! and records a deadline in the slot; the main loop polls the slot and
//! releases the target once the deadline passes. Opcode and arity validation
//! happens here, not at admission, so a bad command is dropped with a log
//! entry only (the host already received its ACK when the frame arrived).

use hidlink_proto::Opcode;

use crate::hid::{HidDriver, MouseButtons};
use crate::interrupt::InterruptFlag;
use crate::log::{LogSink, Logger};
use crate::names::{button_name, KeyLabel};
use crate::queue::QueuedCommand;
use crate::stats::Stats;

/// Which HID device a timed action is holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimedKind {
    Mouse,
    Keyboard,
}

/// An in-flight "hold for N ms" operation.
///
/// While one exists, exactly one button mask or key is held on the
/// firmware's own initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedAction {
    pub kind: TimedKind,
    /// Button mask (mouse) or key code (keyboard).
    pub target: u8,
    pub start_ms: u32,
    pub duration_ms: u16,
}

impl TimedAction {
    /// Whether the hold duration has elapsed at `now_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.start_ms) >= u32::from(self.duration_ms)
    }
}

/// Dequeues one command at a time and owns the timed-action slot.
pub struct Executor {
    timed: Option<TimedAction>,
}

impl Executor {
    #[must_use]
    pub const fn new() -> Self {
        Self { timed: None }
    }

    /// The active timed action, if any.
    #[must_use]
    pub fn timed_action(&self) -> Option<&TimedAction> {
        self.timed.as_ref()
    }

    /// Whether a timed hold is in flight. The caller must not execute
    /// another command while this returns `true`.
    #[must_use]
    pub fn is_timed_active(&self) -> bool {
        self.timed.is_some()
    }

    /// Execute one dequeued command.
    ///
    /// Invalid opcodes and arity mismatches are dropped with a log entry;
    /// no ACK is sent from here. `interrupt` is observed mid-execution only
    /// by `KB_PRINT`, between individual key writes.
    pub fn execute<H: HidDriver, L: LogSink>(
        &mut self,
        entry: QueuedCommand,
        hid: &mut H,
        interrupt: &InterruptFlag,
        logger: &mut Logger<L>,
        stats: &mut Stats,
        now_ms: u32,
    ) {
        let cmd = &entry.command;
        let params = &cmd.params;

        let Some(opcode) = cmd.opcode() else {
            stats.errors_total += 1;
            logger.error(
                now_ms,
                "INVALID_CMD",
                Some(format_args!("Unknown CMD: 0x{:02X}", cmd.opcode)),
                stats.errors_total,
            );
            return;
        };

        if !opcode.accepts_params(params.len()) {
            stats.errors_total += 1;
            logger.error(
                now_ms,
                "PARAM_ERROR",
                Some(format_args!(
                    "CMD 0x{:02X} needs {} bytes, got {}",
                    cmd.opcode,
                    opcode.expected_params(),
                    params.len()
                )),
                stats.errors_total,
            );
            return;
        }

        match opcode {
            Opcode::MouseMove => {
                let (x, y, wheel) = (params[0] as i8, params[1] as i8, params[2] as i8);
                logger.exec(
                    now_ms,
                    "MOUSE_MOVE",
                    Some(format_args!("x={x}, y={y}, wheel={wheel}")),
                );
                hid.mouse_move(x, y, wheel);
            }
            Opcode::MousePress => {
                logger.exec(
                    now_ms,
                    "MOUSE",
                    Some(format_args!("Press ({})", button_name(params[0]))),
                );
                hid.mouse_press(MouseButtons(params[0]));
            }
            Opcode::MouseRelease => {
                logger.exec(
                    now_ms,
                    "MOUSE",
                    Some(format_args!("Release ({})", button_name(params[0]))),
                );
                hid.mouse_release(MouseButtons(params[0]));
            }
            Opcode::MouseClick => {
                logger.exec(
                    now_ms,
                    "MOUSE",
                    Some(format_args!("Click ({})", button_name(params[0]))),
                );
                hid.mouse_click(MouseButtons(params[0]));
            }
            Opcode::MousePressTimed => {
                let button = params[0];
                let duration_ms = cmd.duration_ms();
                logger.exec(
                    now_ms,
                    "MOUSE_TIMED",
                    Some(format_args!(
                        "Hold {} for {}ms",
                        button_name(button),
                        duration_ms
                    )),
                );
                hid.mouse_press(MouseButtons(button));
                self.timed = Some(TimedAction {
                    kind: TimedKind::Mouse,
                    target: button,
                    start_ms: now_ms,
                    duration_ms,
                });
            }
            Opcode::KbPress => {
                let key = params[0];
                logger.exec(
                    now_ms,
                    "KEYBOARD",
                    Some(format_args!("Press {} (0x{key:02X})", KeyLabel(key))),
                );
                hid.kb_press(key);
            }
            Opcode::KbRelease => {
                let key = params[0];
                logger.exec(
                    now_ms,
                    "KEYBOARD",
                    Some(format_args!("Release {} (0x{key:02X})", KeyLabel(key))),
                );
                hid.kb_release(key);
            }
            Opcode::KbWrite => {
                let key = params[0];
                logger.exec(
                    now_ms,
                    "KEYBOARD",
                    Some(format_args!("Write {} (0x{key:02X})", KeyLabel(key))),
                );
                hid.kb_write(key);
            }
            Opcode::KbReleaseAll => {
                logger.exec(now_ms, "KB_RELEASE_ALL", Some(format_args!("All keys released")));
                hid.kb_release_all();
            }
            Opcode::KbPrint => {
                logger.exec(now_ms, "KB_PRINT", None);
                logger.kb_print_text(params);
                for &key in params.iter() {
                    // The only mid-command cancellation point in the pipeline.
                    if interrupt.is_pending() {
                        break;
                    }
                    hid.kb_write(key);
                }
            }
            Opcode::KbPressTimed => {
                let key = params[0];
                let duration_ms = cmd.duration_ms();
                logger.exec(
                    now_ms,
                    "KB_TIMED",
                    Some(format_args!(
                        "Hold {} (0x{key:02X}) for {}ms",
                        KeyLabel(key),
                        duration_ms
                    )),
                );
                hid.kb_press(key);
                self.timed = Some(TimedAction {
                    kind: TimedKind::Keyboard,
                    target: key,
                    start_ms: now_ms,
                    duration_ms,
                });
            }
            // Control-plane opcodes execute in the receive path and are
            // never admitted to the queue.
            Opcode::PauseLog | Opcode::ResumeLog | Opcode::ClearQueue => {}
        }
    }

    /// Release the timed hold once its deadline has passed.
    ///
    /// Returns `true` when a hold was released by this call, so the caller
    /// can keep the release and the next command on separate iterations.
    pub fn poll_timed<H: HidDriver, L: LogSink>(
        &mut self,
        now_ms: u32,
        hid: &mut H,
        logger: &mut Logger<L>,
    ) -> bool {
        let Some(action) = self.timed else {
            return false;
        };
        if !action.is_expired(now_ms) {
            return false;
        }
        self.timed = None;

        match action.kind {
            TimedKind::Mouse => {
                logger.exec(
                    now_ms,
                    "MOUSE_TIMED",
                    Some(format_args!(
                        "Released {} after {}ms",
                        button_name(action.target),
                        action.duration_ms
                    )),
                );
                hid.mouse_release(MouseButtons(action.target));
            }
            TimedKind::Keyboard => {
                logger.exec(
                    now_ms,
                    "KB_TIMED",
                    Some(format_args!(
                        "Released {} (0x{:02X}) after {}ms",
                        KeyLabel(action.target),
                        action.target,
                        action.duration_ms
                    )),
                );
                hid.kb_release(action.target);
            }
        }
        true
    }

    /// Release the held target immediately and clear the slot.
    ///
    /// Used by the interrupt service path. Returns `true` if a hold was
    /// cancelled.
    pub fn cancel_timed<H: HidDriver>(&mut self, hid: &mut H) -> bool {
        let Some(action) = self.timed.take() else {
            return false;
        };
        match action.kind {
            TimedKind::Mouse => hid.mouse_release(MouseButtons(action.target)),
            TimedKind::Keyboard => hid.kb_release(action.target),
        }
        true
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}
