//! Safety-stop flag shared between the button ISR and the main loop.

use core::sync::atomic::{AtomicBool, Ordering};

/// Debounce window for the hardware button.
pub const DEBOUNCE_MS: u32 = 50;

/// Pending-interrupt flag.
///
/// The ISR is strictly a producer ([`raise`](Self::raise)) and the main loop
/// a strictly-after consumer ([`is_pending`](Self::is_pending) then
/// [`clear`](Self::clear)), so plain atomic load/store is sufficient; no
/// read-modify-write is needed on the target class.
pub struct InterruptFlag {
    pending: AtomicBool,
}

impl InterruptFlag {
    /// Create a flag in the cleared state. Usable in `static` initializers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark an interrupt as pending. ISR context.
    #[inline]
    pub fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Check whether an interrupt is pending. Main-loop context.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Clear the flag after servicing. Main-loop context.
    #[inline]
    pub fn clear(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

impl Default for InterruptFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Edge debouncer for the panic button.
///
/// Lives entirely in ISR context: the timestamp is written and read only by
/// the interrupt handler, which is serialized by the hardware (a single
/// edge-triggered pin cannot re-enter its own handler).
pub struct Debouncer {
    last_press_ms: Option<u32>,
}

impl Debouncer {
    #[must_use]
    pub const fn new() -> Self {
        Self { last_press_ms: None }
    }

    /// Report a falling edge at `now_ms`. Returns `true` when the edge is
    /// outside the debounce window and should raise the interrupt flag.
    pub fn accept(&mut self, now_ms: u32) -> bool {
        match self.last_press_ms {
            Some(last) if now_ms.wrapping_sub(last) <= DEBOUNCE_MS => false,
            _ => {
                self.last_press_ms = Some(now_ms);
                true
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}
