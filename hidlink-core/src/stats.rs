//! Traffic counters and the periodic statistics block.

use crate::log::{LogSink, Logger};

/// How often the statistics block is emitted.
pub const STATS_INTERVAL_MS: u32 = 30_000;

/// Traffic counters. Reset on every statistics emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Frames whose LEN byte was accepted.
    pub packets_total: u32,
    /// ACK_SUCCESS bytes sent.
    pub acks_success: u32,
    /// Errors across parser, dispatcher, and executor.
    pub errors_total: u32,
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            packets_total: 0,
            acks_success: 0,
            errors_total: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Emits the statistics block on a fixed cadence and resets the counters.
pub struct StatsReporter {
    last_emit_ms: u32,
}

impl StatsReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self { last_emit_ms: 0 }
    }

    /// Emit the block if the interval has elapsed. Returns `true` on emission.
    pub fn poll<L: LogSink>(
        &mut self,
        now_ms: u32,
        stats: &mut Stats,
        queue_len: usize,
        queue_capacity: usize,
        logger: &mut Logger<L>,
    ) -> bool {
        if now_ms.wrapping_sub(self.last_emit_ms) < STATS_INTERVAL_MS {
            return false;
        }
        self.last_emit_ms = now_ms;

        let uptime_s = now_ms / 1000;
        let (h, m, s) = (uptime_s / 3600, (uptime_s % 3600) / 60, uptime_s % 60);

        logger.plain(format_args!("--- Statistics ---"));
        logger.plain(format_args!("Uptime: {h}h {m}m {s}s"));
        logger.plain(format_args!("Total Packets: {}", stats.packets_total));
        logger.plain(format_args!("Successful: {}", stats.acks_success));
        logger.plain(format_args!("Errors: {}", stats.errors_total));
        if stats.packets_total > 0 {
            // Basis points keep two decimals without floating point.
            let bp = u64::from(stats.acks_success) * 10_000 / u64::from(stats.packets_total);
            logger.plain(format_args!("Success Rate: {}.{:02}%", bp / 100, bp % 100));
        } else {
            logger.plain(format_args!("Success Rate: N/A"));
        }
        logger.plain(format_args!("Queue Size: {queue_len}/{queue_capacity}"));
        logger.plain(format_args!("------------------"));

        stats.reset();
        true
    }
}

impl Default for StatsReporter {
    fn default() -> Self {
        Self::new()
    }
}
