//! MQTT 3.1.1 session for embedded systems.
//!
//! The client in this module is the MQTT collaborator of the demo firmware:
//! it owns a transport [`Connection`](crate::network::Connection), performs
//! the CONNECT handshake and then exposes publish, subscribe, unsubscribe,
//! yield and disconnect. Framing stays inside this module; callers only see
//! topics, [`Message`](client::Message)s and [`MessageHandler`](client::MessageHandler)s.
//!
//! # Key Features
//!
//! - MQTT 3.1.1 (protocol level 4), optional username/password
//! - QoS 0 publish and subscribe
//! - Keep-alive serviced from [`Client::yield_for`](client::Client::yield_for)
//! - Fixed-size buffers, no allocation

/// MQTT client implementation and supporting types.
pub mod client;

pub use client::{Client, Message, MessageData, MessageHandler, Options, QoS};
