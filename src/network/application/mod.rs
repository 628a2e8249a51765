//! # Application Layer Network Protocols
//!
//! Protocols the demo firmware speaks on top of the transport traits in
//! [`network`](crate::network):
//!
//! - **[`mqtt`]**: MQTT 3.1.1 session over a stream [`Connection`](crate::network::Connection)
//! - **[`ntp`]**: one-shot SNTP query over a [`UdpSocket`](crate::network::UdpSocket)
//!
//! Both are connection agnostic, `no_std` and use fixed-size buffers only.

/// MQTT client implementation.
pub mod mqtt;

/// SNTP client implementation.
pub mod ntp;
