//! An SNTP client over the [`UdpSocket`] trait.
use crate::network::UdpSocket;
use crate::network::error::Error;
use crate::system::clock::Timestamp;
use core::net::SocketAddr;

/// Size of an NTP packet without extension fields.
pub const NTP_PACKET_SIZE: usize = 48;
/// Well-known NTP port.
pub const NTP_PORT: u16 = 123;
/// Seconds between the NTP era origin (1900) and the Unix epoch (1970).
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;
/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_REQUEST: u8 = 0x1B;
/// Mode = 4 (server).
const MODE_SERVER: u8 = 4;
/// Offset of the transmit timestamp's seconds field.
const TRANSMIT_SECS: usize = 40;
/// Datagrams from other senders tolerated before giving up.
const MAX_STRAY_DATAGRAMS: usize = 4;

/// A one-shot SNTP client bound to a datagram socket.
///
/// The socket is owned by the client and released when the client is
/// dropped, so a scope around the client bounds the socket's lifetime.
#[derive(Debug)]
pub struct Client<U: UdpSocket> {
    socket: U,
    server: Option<SocketAddr>,
}

impl<U: UdpSocket> Client<U> {
    /// Wraps an open datagram socket.
    pub fn new(socket: U) -> Self {
        Self {
            socket,
            server: None,
        }
    }

    /// Sets the server to query.
    pub fn set_server(&mut self, server: SocketAddr) {
        self.server = Some(server);
    }

    /// Queries the server once and returns its transmit time.
    ///
    /// The result is not validated beyond the packet format: a server that
    /// answers with a zero transmit timestamp yields a negative
    /// [`Timestamp`], which callers must treat as a failed sync.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidAddress`] - No server set
    /// * [`Error::WriteError`] - The request could not be sent
    /// * [`Error::ReadError`] - No reply could be read
    /// * [`Error::ProtocolError`] - The reply is not a server-mode NTP packet
    pub fn get_timestamp(&mut self) -> Result<Timestamp, Error> {
        let server = self.server.ok_or(Error::InvalidAddress)?;

        let mut request = [0u8; NTP_PACKET_SIZE];
        request[0] = CLIENT_REQUEST;
        self.socket
            .send_to(server, &request)
            .map_err(|_| Error::WriteError)?;

        let mut reply = [0u8; NTP_PACKET_SIZE];
        for _ in 0..MAX_STRAY_DATAGRAMS {
            let (len, from) = self
                .socket
                .recv_from(&mut reply)
                .map_err(|_| Error::ReadError)?;
            if from.ip() != server.ip() {
                log::debug!("ignoring datagram from {}", from);
                continue;
            }
            return parse_reply(&reply[..len]);
        }
        Err(Error::ProtocolError)
    }
}

fn parse_reply(reply: &[u8]) -> Result<Timestamp, Error> {
    if reply.len() < NTP_PACKET_SIZE || reply[0] & 0x07 != MODE_SERVER {
        return Err(Error::ProtocolError);
    }
    let secs = u32::from_be_bytes([
        reply[TRANSMIT_SECS],
        reply[TRANSMIT_SECS + 1],
        reply[TRANSMIT_SECS + 2],
        reply[TRANSMIT_SECS + 3],
    ]);
    Ok(Timestamp(i64::from(secs) - NTP_UNIX_OFFSET))
}
