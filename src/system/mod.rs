//! System utilities for the demo board.
//!
//! This module holds the small pieces of process-wide state the firmware
//! needs outside of any one peripheral or protocol:
//!
//! - **[`signal`]**: interrupt-safe edge flags shared between an interrupt
//!   handler and the main loop
//! - **[`clock`]**: the real-time clock set once from NTP, and the monotonic
//!   time source used for keepalive and timeouts
//!
//! Everything here is `no_std` and allocation free.

/// Interrupt-safe flags.
///
/// A [`Flag`](signal::Flag) is raised by exactly one producer (an interrupt
/// handler or a message callback) and consumed by exactly one consumer.
pub mod signal;

/// Wall clock and monotonic time.
pub mod clock;
