//! SNTP (RFC 4330) client for one-shot clock synchronization.
//!
//! The firmware asks a single time server for the current time once at
//! startup. There is no periodic resync, no clock discipline and no
//! round-trip correction; the server's transmit timestamp is taken as-is.

/// SNTP client implementation.
pub mod client;

pub use client::Client;
