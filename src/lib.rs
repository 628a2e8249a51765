//! # mqtt-button - button-triggered MQTT publisher
//!
//! Firmware logic for an Ethernet-connected board with one push button and
//! three status LEDs. At startup the board brings its network interface up,
//! sets its clock from a time server, connects to an MQTT broker and
//! subscribes to one topic. It then polls: the red LED blinks as a
//! heartbeat, every received message is logged and flashes the green LED,
//! and every button press publishes a numbered message and flashes the blue
//! LED. When the broker session dies the firmware tears everything down in
//! reverse order.
//!
//! The crate is `no_std` and allocation free. Everything it needs from the
//! board comes in through traits:
//!
//! - [`network::Interface`], [`network::TcpSocket`], [`network::UdpSocket`]
//!   and [`network::Connection`] for networking
//! - [`embedded_hal::digital::StatefulOutputPin`] for the LEDs
//! - [`embedded_hal::delay::DelayNs`] for sleeps and retry backoff
//! - [`system::clock::Monotonic`] for keepalive and timeouts
//!
//! ## Usage
//!
//! ```rust,no_run
//! # #[cfg(feature = "std")]
//! # fn main() {
//! use mqtt_button::app::{self, Config};
//! use mqtt_button::app::connector::CancelToken;
//! use mqtt_button::network::std::HostInterface;
//! use mqtt_button::peripherals::{Button, Leds, LogPin};
//! use mqtt_button::system::clock::StdMonotonic;
//! # struct Sleep;
//! # impl embedded_hal::delay::DelayNs for Sleep {
//! #     fn delay_ns(&mut self, ns: u32) {
//! #         std::thread::sleep(std::time::Duration::from_nanos(ns.into()))
//! #     }
//! # }
//!
//! static BUTTON: Button = Button::new();
//! static CANCEL: CancelToken = CancelToken::new();
//!
//! let config = Config::default();
//! let mut leds = Leds::new(LogPin::new("red"), LogPin::new("green"), LogPin::new("blue"));
//! let result = app::run(
//!     Some(HostInterface::new()),
//!     &config,
//!     &mut leds,
//!     &BUTTON,
//!     &CANCEL,
//!     &mut Sleep,
//!     StdMonotonic::new(),
//! );
//! # let _ = result;
//! # }
//! # #[cfg(not(feature = "std"))]
//! # fn main() {}
//! ```
//!
//! ## Optional Features
//!
//! - `std`: host networking over `std::net`, a `std::time` monotonic clock,
//!   human-readable timestamps and the `mqtt-button` binary
//! - `defmt`: `defmt::Format` for the error types

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Network abstraction layer: transport traits, the MQTT and NTP clients,
/// and host adapters.
pub mod network;

/// Process-wide signals and clocks.
pub mod system;

/// Status LEDs and the publish button.
pub mod peripherals;

/// Startup sequence, main loop and shutdown.
pub mod app;
