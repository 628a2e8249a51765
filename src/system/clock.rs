//! Wall clock and monotonic time sources.
//!
//! The wall clock is process-wide: it is set once after NTP sync and read by
//! logging. It stores 32-bit values so that it works on targets without
//! 64-bit atomics.

use core::sync::atomic::{AtomicU32, Ordering};

/// Seconds since the Unix epoch, as reported by a time server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Seconds since the Unix epoch.
    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match chrono::DateTime::from_timestamp(self.0, 0) {
            Some(at) => write!(f, "{}", at.format("%a %b %e %H:%M:%S %Y")),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(not(feature = "std"))]
impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} s since epoch", self.0)
    }
}

/// A monotonic millisecond counter. Never goes backwards.
pub trait Monotonic {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;
}

impl<M: Monotonic + ?Sized> Monotonic for &M {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Monotonic clock backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdMonotonic {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdMonotonic {
    /// Starts counting from now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdMonotonic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Monotonic for StdMonotonic {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

// 0 means "never set".
static RTC_EPOCH_SECS: AtomicU32 = AtomicU32::new(0);
static RTC_SET_AT_SECS: AtomicU32 = AtomicU32::new(0);

/// Sets the process-wide wall clock.
///
/// `uptime` is the monotonic source the clock advances with afterwards.
/// Timestamps outside `1..=u32::MAX` are ignored.
pub fn set_time(now: Timestamp, uptime: &impl Monotonic) {
    let Ok(secs) = u32::try_from(now.0) else {
        return;
    };
    if secs == 0 {
        return;
    }
    RTC_SET_AT_SECS.store((uptime.now_ms() / 1000) as u32, Ordering::Relaxed);
    RTC_EPOCH_SECS.store(secs, Ordering::Release);
}

/// Current wall-clock time, or `None` before [`set_time`] has run.
pub fn time(uptime: &impl Monotonic) -> Option<Timestamp> {
    let epoch = RTC_EPOCH_SECS.load(Ordering::Acquire);
    if epoch == 0 {
        return None;
    }
    let set_at = RTC_SET_AT_SECS.load(Ordering::Relaxed);
    let elapsed = ((uptime.now_ms() / 1000) as u32).wrapping_sub(set_at);
    Some(Timestamp(i64::from(epoch) + i64::from(elapsed)))
}
