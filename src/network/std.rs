//! Host networking over `std::net`.
//!
//! Lets the firmware logic run on a development machine: the host's default
//! route stands in for the board's Ethernet interface.

use crate::network::error::Error;
use crate::network::{Close, Connection, Interface, Read, TcpSocket, UdpSocket, Write};
use core::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpStream, ToSocketAddrs, UdpSocket as StdUdpSocket};
use std::time::Duration;

/// How long a single stream read blocks before reporting "no data".
pub const READ_POLL: Duration = Duration::from_millis(10);
/// Timeout for establishing a stream connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long a datagram read waits for a reply.
pub const DATAGRAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Probe address used to learn which local address the default route uses.
/// Nothing is sent to it.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// The host's default network interface.
#[derive(Debug, Default)]
pub struct HostInterface {
    address: Option<IpAddr>,
}

impl HostInterface {
    /// Creates an interface handle in the down state.
    pub fn new() -> Self {
        Self::default()
    }

    fn up(&self) -> Result<IpAddr, Error> {
        self.address.ok_or(Error::NotOpen)
    }
}

impl Interface for HostInterface {
    type Error = Error;
    type TcpSocket = HostTcpSocket;
    type UdpSocket = HostUdpSocket;

    fn connect(&mut self) -> Result<(), Self::Error> {
        let probe = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|_| Error::NoInterface)?;
        probe.connect(ROUTE_PROBE).map_err(|_| Error::NoInterface)?;
        let local = probe.local_addr().map_err(|_| Error::NoInterface)?;
        self.address = Some(local.ip());
        Ok(())
    }

    fn ip_address(&mut self) -> Result<IpAddr, Self::Error> {
        self.up()
    }

    fn get_host_by_name(&mut self, host: &str) -> Result<IpAddr, Self::Error> {
        self.up()?;
        let addrs: Vec<SocketAddr> = (host, 0)
            .to_socket_addrs()
            .map_err(|_| Error::Dns)?
            .collect();
        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or(addrs.first())
            .map(|a| a.ip())
            .ok_or(Error::Dns)
    }

    fn open_tcp(&mut self) -> Result<Self::TcpSocket, Self::Error> {
        self.up()?;
        Ok(HostTcpSocket { read_poll: READ_POLL })
    }

    fn open_udp(&mut self) -> Result<Self::UdpSocket, Self::Error> {
        self.up()?;
        let socket = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(|_| Error::NotOpen)?;
        socket
            .set_read_timeout(Some(DATAGRAM_TIMEOUT))
            .map_err(|_| Error::NotOpen)?;
        Ok(HostUdpSocket { socket })
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.address.take().map(|_| ()).ok_or(Error::NotOpen)
    }
}

/// A stream socket not yet connected.
#[derive(Debug)]
pub struct HostTcpSocket {
    read_poll: Duration,
}

impl TcpSocket for HostTcpSocket {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(self, remote: SocketAddr) -> Result<Self::Connection, Self::Error> {
        let stream =
            TcpStream::connect_timeout(&remote, CONNECT_TIMEOUT).map_err(|e| match e.kind() {
                ErrorKind::ConnectionRefused => Error::ConnectionRefused,
                ErrorKind::TimedOut => Error::Timeout,
                _ => Error::InvalidAddress,
            })?;
        stream
            .set_read_timeout(Some(self.read_poll))
            .map_err(|_| Error::NotOpen)?;
        let _ = stream.set_nodelay(true);
        Ok(TcpConnection { stream })
    }
}

/// A connected stream.
///
/// A read that times out reports `Ok(0)` ("no data yet"); end of stream is
/// reported as [`Error::ConnectionClosed`].
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl Read for TcpConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => Err(Error::ConnectionClosed),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(_) => Err(Error::ReadError),
        }
    }
}

impl Write for TcpConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Close for TcpConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        self.stream
            .shutdown(Shutdown::Both)
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Connection for TcpConnection {}

/// A bound datagram socket.
#[derive(Debug)]
pub struct HostUdpSocket {
    socket: StdUdpSocket,
}

impl UdpSocket for HostUdpSocket {
    type Error = Error;

    fn send_to(&mut self, remote: SocketAddr, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket
            .send_to(buf, remote)
            .map_err(|_| Error::WriteError)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error> {
        self.socket.recv_from(buf).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Timeout,
            _ => Error::ReadError,
        })
    }
}
