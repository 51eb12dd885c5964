//! Platform-agnostic command pipeline for the hidlink serial-to-HID bridge.
//!
//! This crate contains everything between the serial byte stream and the USB
//! HID device layer, with no platform dependencies: it runs identically on
//! the target and on the host under test.
//!
//! # Overview
//!
//! - [`engine`]: the pipeline glue ([`Engine`]) driven by the firmware main
//!   loop
//! - [`queue`]: bounded FIFO of admitted commands ([`CommandQueue`])
//! - [`executor`]: command execution and the timed-action slot ([`Executor`])
//! - [`interrupt`]: safety-stop flag and button debouncer ([`InterruptFlag`],
//!   [`Debouncer`])
//! - [`stats`]: traffic counters and the periodic report ([`Stats`],
//!   [`StatsReporter`])
//! - [`log`]: the diagnostic text channel ([`Logger`], [`LogSink`])
//! - [`hid`]: the HID device capability trait ([`HidDriver`],
//!   [`MouseButtons`])
//! - [`names`]: key/button name tables for the log channel
//!
//! # Concurrency model
//!
//! One main loop, one asynchronous producer (the hardware button). The main
//! loop never blocks: timed holds are deadlines in a slot, not sleeps, so
//! the safety stop and frame parsing stay responsive regardless of queue
//! depth or hold duration. The only cross-context state is the
//! [`InterruptFlag`] (plus the debounce timestamp, which never leaves the
//! ISR).
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

pub mod engine;
pub mod executor;
pub mod hid;
pub mod interrupt;
pub mod log;
pub mod names;
pub mod queue;
pub mod stats;

// Re-export main types at crate root
pub use engine::{AckSink, Engine};
pub use executor::{Executor, TimedAction, TimedKind};
pub use hid::{HidDriver, MouseButtons};
pub use interrupt::{Debouncer, InterruptFlag, DEBOUNCE_MS};
pub use log::{LogSink, Logger, Verbosity, MAX_LOG_LINE};
pub use queue::{CommandQueue, QueueFull, QueuedCommand, QUEUE_CAPACITY};
pub use stats::{Stats, StatsReporter, STATS_INTERVAL_MS};
