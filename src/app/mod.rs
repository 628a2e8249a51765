//! # Demo firmware orchestration
//!
//! The firmware is one linear startup sequence followed by a cooperative
//! polling loop:
//!
//! 1. [`connector`]: bring the network interface up, retrying per policy
//! 2. [`time_sync`]: set the wall clock from a time server
//! 3. [`transport`]: open a stream socket and connect it to the broker
//! 4. [`session`]: MQTT handshake, arm the button, subscribe
//! 5. [`runner`]: heartbeat/yield/receive/publish loop until the session
//!    dies, then the shutdown sequence
//!
//! Every piece talks to the outside world only through the traits in
//! [`network`](crate::network), [`embedded_hal`] pins and delays, and the
//! [`Session`](session::Session) trait, so the whole sequence runs against
//! mocks in tests and against `std::net` on a host.

/// Runtime configuration and its defaults.
pub mod config;

/// Startup failure classification and exit codes.
pub mod error;

/// Network interface bring-up with retry and cancellation.
pub mod connector;

/// One-shot NTP clock synchronization.
pub mod time_sync;

/// Broker stream socket.
pub mod transport;

/// MQTT session capability, message buffer and publish counter.
pub mod session;

/// Main loop, shutdown sequence and the top-level [`run`](runner::run).
pub mod runner;

pub use config::{Config, RetryPolicy};
pub use error::Error;
pub use runner::{ExitReason, run};
