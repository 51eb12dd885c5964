//! Bounded FIFO of admitted commands.

use hidlink_proto::Command;

/// Queue capacity. Admission fails once this many commands are pending.
pub const QUEUE_CAPACITY: usize = 16;

/// A command together with its admission timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub command: Command,
    /// Monotonic millisecond counter value at admission.
    pub enqueued_at_ms: u32,
}

/// Admission was refused because the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Bounded FIFO of decoded commands.
///
/// Commands execute strictly in admission order; there is no re-ordering or
/// prioritization. The backing storage is inline (no heap).
pub struct CommandQueue {
    entries: heapless::Deque<QueuedCommand, QUEUE_CAPACITY>,
}

impl CommandQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: heapless::Deque::new(),
        }
    }

    /// Admit a command, stamping it with `now_ms`.
    pub fn admit(&mut self, command: Command, now_ms: u32) -> Result<(), QueueFull> {
        self.entries
            .push_back(QueuedCommand {
                command,
                enqueued_at_ms: now_ms,
            })
            .map_err(|_| QueueFull)
    }

    /// Remove and return the oldest admitted command.
    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.entries.pop_front()
    }

    /// Discard all pending commands.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(opcode: u8) -> Command {
        Command::from_payload(&[opcode, 0x01]).unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = CommandQueue::new();
        queue.admit(command(0x02), 10).unwrap();
        queue.admit(command(0x03), 20).unwrap();

        let first = queue.pop().unwrap();
        assert_eq!(first.command.opcode, 0x02);
        assert_eq!(first.enqueued_at_ms, 10);
        let second = queue.pop().unwrap();
        assert_eq!(second.command.opcode, 0x03);
        assert_eq!(second.enqueued_at_ms, 20);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_admission_stops_at_capacity() {
        let mut queue = CommandQueue::new();
        for i in 0..QUEUE_CAPACITY {
            assert_eq!(queue.admit(command(0x04), i as u32), Ok(()));
        }
        assert!(queue.is_full());
        assert_eq!(queue.len(), QUEUE_CAPACITY);
        assert_eq!(queue.admit(command(0x04), 99), Err(QueueFull));
        assert_eq!(queue.len(), QUEUE_CAPACITY);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut queue = CommandQueue::new();
        for _ in 0..5 {
            queue.admit(command(0x01), 0).unwrap();
        }
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_clear_on_empty_is_noop() {
        let mut queue = CommandQueue::new();
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_admit_after_drain_reuses_capacity() {
        let mut queue = CommandQueue::new();
        // Cycle through more commands than the capacity to exercise wrap-around.
        for round in 0..3u32 {
            for i in 0..QUEUE_CAPACITY {
                queue.admit(command(0x10), round * 100 + i as u32).unwrap();
            }
            for _ in 0..QUEUE_CAPACITY {
                assert!(queue.pop().is_some());
            }
        }
        assert!(queue.is_empty());
    }
}
