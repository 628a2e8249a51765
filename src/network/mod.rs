//! A network abstraction layer for the board's Ethernet interface
//!
//! The orchestration code never talks to a concrete network stack. It sees a
//! network [`Interface`] that can be brought up and torn down, stream sockets
//! opened against it ([`TcpSocket`] → [`Connection`]) and datagram sockets
//! ([`UdpSocket`]) for the one-shot clock sync.
//!

#![allow(missing_docs)]
#![deny(unsafe_code)]

use core::net::{IpAddr, SocketAddr};

/// Common error types for network operations
pub mod error;

/// Application protocols layered over the transport traits
pub mod application;

/// Host implementations over `std::net`
#[cfg(feature = "std")]
pub mod std;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Close, Connection, Interface, Read, TcpSocket, UdpSocket, Write};
}

// Core synchronous traits
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection.
    ///
    /// `Ok(0)` means no data is available right now.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Close {}

/// A stream socket that has been opened on an interface but not yet connected.
///
/// Opening and connecting are separate phases so that each can fail on its own.
pub trait TcpSocket {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Connect to the remote endpoint, consuming the socket
    fn connect(self, remote: SocketAddr) -> Result<Self::Connection, Self::Error>;
}

/// A datagram socket
pub trait UdpSocket {
    type Error: core::fmt::Debug;
    /// Send one datagram to `remote`
    fn send_to(&mut self, remote: SocketAddr, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Receive one datagram, returning its length and sender
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error>;
}

/// A network interface (Ethernet, Wi-Fi, a host stack, ...).
///
/// Sockets opened from an interface must not be used after
/// [`disconnect`](Interface::disconnect).
pub trait Interface {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Stream socket type
    type TcpSocket: TcpSocket;
    /// Datagram socket type
    type UdpSocket: UdpSocket;

    /// Bring the interface up
    fn connect(&mut self) -> Result<(), Self::Error>;
    /// Address assigned to the interface
    fn ip_address(&mut self) -> Result<IpAddr, Self::Error>;
    /// Resolve a host name to an address
    fn get_host_by_name(&mut self, host: &str) -> Result<IpAddr, Self::Error>;
    /// Open a stream socket on this interface
    fn open_tcp(&mut self) -> Result<Self::TcpSocket, Self::Error>;
    /// Open a datagram socket on this interface
    fn open_udp(&mut self) -> Result<Self::UdpSocket, Self::Error>;
    /// Take the interface down
    fn disconnect(&mut self) -> Result<(), Self::Error>;
}
