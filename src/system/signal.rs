//! Single-producer, single-consumer edge flags.

use core::sync::atomic::{AtomicBool, Ordering};

/// A boolean flag shared between an interrupt context and the main loop.
///
/// Raising an already-raised flag is a no-op, so any number of edges between
/// two [`take`](Flag::take) calls collapse into one observation.
#[derive(Debug)]
pub struct Flag {
    raised: AtomicBool,
}

impl Flag {
    /// Creates a lowered flag. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Raises the flag.
    ///
    /// Safe to call from interrupt context: a single atomic store, no
    /// blocking, no allocation.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Lowers the flag and reports whether it was raised.
    ///
    /// Runs inside a critical section and needs only atomic loads and
    /// stores, so it builds for riscv32imc and thumbv6m.
    pub fn take(&self) -> bool {
        critical_section::with(|_| {
            let raised = self.raised.load(Ordering::Acquire);
            if raised {
                self.raised.store(false, Ordering::Release);
            }
            raised
        })
    }

    /// Reports whether the flag is raised without consuming it.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new()
    }
}
