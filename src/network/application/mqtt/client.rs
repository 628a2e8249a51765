//! MQTT 3.1.1 client session for embedded systems.
//!
//! This module provides a small, blocking MQTT client built on the
//! [`Connection`] trait. It is driven the way a cooperative main loop drives
//! it: the caller invokes [`Client::yield_for`] periodically, and the client
//! uses that time to read inbound packets, dispatch PUBLISH messages to the
//! registered [`MessageHandler`]s and keep the session alive with PINGREQ.
//!
//! # Features
//!
//! - MQTT 3.1.1 (protocol level 4) CONNECT with optional username/password
//! - SUBSCRIBE / UNSUBSCRIBE with per-filter message handlers
//! - PUBLISH at QoS 0 (QoS 1 inbound messages are acknowledged)
//! - Keepalive via PINGREQ/PINGRESP
//! - Fixed-size buffers for predictable memory usage
//!
//! # Examples
//!
//! ```ignore
//! let options = Options {
//!     client_id: "sensor_device_01",
//!     username: None,
//!     password: None,
//!     keep_alive_seconds: 60,
//!     clean_session: true,
//! };
//!
//! let mut client = Client::connect(connection, clock, options)?;
//! client.subscribe("commands/#", QoS::AtMostOnce, &handler)?;
//! loop {
//!     client.yield_for(100)?;
//! }
//! ```

use crate::network::error::Error;
use crate::network::Connection;
use crate::system::clock::Monotonic;
use heapless::{String, Vec};

// MQTT Control Packet types - these are the fixed header packet type values
/// MQTT CONNECT packet type identifier.
const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier.
const PUBLISH: u8 = 0x30;
/// MQTT PUBACK packet type identifier.
const PUBACK: u8 = 0x40;
/// MQTT SUBSCRIBE packet type identifier (with the mandatory flag bits).
const SUBSCRIBE: u8 = 0x82;
/// MQTT SUBACK packet type identifier.
const SUBACK: u8 = 0x90;
/// MQTT UNSUBSCRIBE packet type identifier (with the mandatory flag bits).
const UNSUBSCRIBE: u8 = 0xA2;
/// MQTT UNSUBACK packet type identifier.
const UNSUBACK: u8 = 0xB0;
/// MQTT PINGREQ packet type identifier.
const PINGREQ: u8 = 0xC0;
/// MQTT PINGRESP packet type identifier.
const PINGRESP: u8 = 0xD0;
/// MQTT DISCONNECT packet type identifier.
const DISCONNECT: u8 = 0xE0;

// Protocol constants defined by MQTT 3.1.1 specification
/// MQTT protocol name as defined in the specification.
const PROTOCOL_NAME: &[u8] = b"MQTT";
/// MQTT protocol level for version 3.1.1.
const PROTOCOL_LEVEL: u8 = 4;

/// Longest topic name or filter the client handles.
pub const MAX_TOPIC_LEN: usize = 256;
/// Number of simultaneously registered message handlers.
pub const MAX_SUBSCRIPTIONS: usize = 5;
/// Size of the inbound packet buffer. Larger packets are discarded.
pub const RX_BUFFER_SIZE: usize = 1536;
/// Size of the outbound packet buffer.
pub const TX_BUFFER_SIZE: usize = 1024;
/// How long CONNECT, SUBSCRIBE and UNSUBSCRIBE wait for their acknowledgement.
pub const COMMAND_TIMEOUT_MS: u64 = 30_000;
/// Consecutive empty reads tolerated in the middle of a packet.
const MAX_STALLS: usize = 64;

/// Quality of Service levels for MQTT messages.
///
/// QoS defines the guarantee of delivery for a specific message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// **QoS 0**: At most once delivery. No acknowledgement, no retry.
    AtMostOnce = 0,
    /// **QoS 1**: At least once delivery.
    AtLeastOnce = 1,
    /// **QoS 2**: Exactly once delivery.
    ExactlyOnce = 2,
}

impl QoS {
    fn from_bits(bits: u8) -> Result<Self, Error> {
        match bits {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(Error::ProtocolError),
        }
    }
}

/// An application message, outbound or inbound.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Message<'a> {
    /// Delivery guarantee.
    pub qos: QoS,
    /// Whether the broker should retain the message.
    pub retained: bool,
    /// Redelivery marker.
    pub dup: bool,
    /// Message identifier. Only sent on the wire for QoS 1 and 2.
    pub id: u16,
    /// Message body.
    pub payload: &'a [u8],
}

/// An inbound message together with the topic it was published on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MessageData<'a> {
    /// Topic name of the PUBLISH packet.
    pub topic: &'a str,
    /// The message itself.
    pub message: Message<'a>,
}

/// Receives messages for a subscription.
///
/// Handlers run synchronously inside [`Client::yield_for`] (or while the
/// client waits for an acknowledgement), on the caller's thread.
pub trait MessageHandler {
    /// Called once per inbound PUBLISH whose topic matches the subscription.
    fn on_message(&self, data: &MessageData<'_>);
}

/// Configuration options for MQTT client connection.
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// The client identifier, must be unique within the broker.
    pub client_id: &'a str,
    /// User name. `None` or an empty string omits it.
    pub username: Option<&'a str>,
    /// Password. Only sent together with a user name.
    pub password: Option<&'a str>,
    /// The keep-alive time interval in seconds. 0 disables keep-alive.
    pub keep_alive_seconds: u16,
    /// Whether to start a clean session.
    pub clean_session: bool,
}

struct Subscription<'h> {
    filter: String<MAX_TOPIC_LEN>,
    handler: Option<&'h dyn MessageHandler>,
}

/// An MQTT 3.1.1 client session.
///
/// # Type Parameters
///
/// * `'h` - Lifetime of the registered message handlers
/// * `C` - The connection type implementing [`Connection`]
/// * `M` - The monotonic clock used for keepalive and timeouts
pub struct Client<'h, C: Connection, M: Monotonic> {
    connection: C,
    clock: M,
    is_connected: bool,
    keep_alive_ms: u64,
    last_sent_ms: u64,
    ping_sent_ms: Option<u64>,
    next_packet_id: u16,
    subscriptions: Vec<Subscription<'h>, MAX_SUBSCRIPTIONS>,
    rx: Vec<u8, RX_BUFFER_SIZE>,
}

impl<C: Connection, M: Monotonic> core::fmt::Debug for Client<'_, C, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("is_connected", &self.is_connected)
            .field("keep_alive_ms", &self.keep_alive_ms)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl<'h, C: Connection, M: Monotonic> Client<'h, C, M> {
    /// Establish an MQTT connection with the broker.
    ///
    /// Sends a CONNECT packet and waits up to [`COMMAND_TIMEOUT_MS`] for the
    /// CONNACK. A single attempt is made.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteError`] - Failed to send CONNECT packet
    /// * [`Error::ReadError`] - Failed to read CONNACK response
    /// * [`Error::Timeout`] - No CONNACK within the command timeout
    /// * [`Error::ConnectionRefused`] - Broker refused the connection
    /// * [`Error::ProtocolError`] - Invalid CONNACK packet received
    ///
    /// On any of these the connection is closed before the error is returned.
    pub fn connect(connection: C, clock: M, options: Options) -> Result<Self, Error> {
        let mut client = Self {
            connection,
            clock,
            is_connected: false,
            keep_alive_ms: u64::from(options.keep_alive_seconds) * 1000,
            last_sent_ms: 0,
            ping_sent_ms: None,
            next_packet_id: 1,
            subscriptions: Vec::new(),
            rx: Vec::new(),
        };

        match client.handshake(&options) {
            Ok(()) => Ok(client),
            Err(e) => {
                if let Err(close_error) = client.connection.close() {
                    log::warn!("closing after failed handshake: {:?}", close_error);
                }
                Err(e)
            }
        }
    }

    fn handshake(&mut self, options: &Options) -> Result<(), Error> {
        let username = options.username.filter(|u| !u.is_empty());
        let password = username.and(options.password);

        // --- Variable Header ---
        let mut body: Vec<u8, TX_BUFFER_SIZE> = Vec::new();
        put_bytes(&mut body, PROTOCOL_NAME)?;
        put(&mut body, &[PROTOCOL_LEVEL])?;

        let mut connect_flags = 0;
        if options.clean_session {
            connect_flags |= 0x02;
        }
        if username.is_some() {
            connect_flags |= 0x80;
        }
        if password.is_some() {
            connect_flags |= 0x40;
        }
        put(&mut body, &[connect_flags])?;
        put(&mut body, &options.keep_alive_seconds.to_be_bytes())?;

        // --- Payload ---
        put_bytes(&mut body, options.client_id.as_bytes())?;
        if let Some(username) = username {
            put_bytes(&mut body, username.as_bytes())?;
        }
        if let Some(password) = password {
            put_bytes(&mut body, password.as_bytes())?;
        }

        self.send_packet(CONNECT, &body)?;
        self.wait_for(CONNACK)?;

        if self.rx.len() != 2 {
            return Err(Error::ProtocolError);
        }

        // Check connection acknowledgement status
        match self.rx[1] {
            0 => {
                self.is_connected = true;
                Ok(())
            }
            1..=5 => Err(Error::ConnectionRefused),
            _ => Err(Error::ProtocolError),
        }
    }

    /// Whether the session is believed to be alive.
    ///
    /// Becomes `false` after any transport failure, a missed PINGRESP, or
    /// [`disconnect`](Client::disconnect).
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    /// Publish a message to a specific topic.
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - The session is not connected
    /// * [`Error::WriteError`] - Failed to send the publish packet
    /// * [`Error::BufferOverflow`] - Topic and payload do not fit the packet buffer
    pub fn publish(&mut self, topic: &str, message: &Message<'_>) -> Result<(), Error> {
        self.ensure_connected()?;

        let mut body: Vec<u8, TX_BUFFER_SIZE> = Vec::new();
        put_bytes(&mut body, topic.as_bytes())?;
        if message.qos != QoS::AtMostOnce {
            put(&mut body, &message.id.to_be_bytes())?;
        }
        put(&mut body, message.payload)?;

        let mut header = PUBLISH | ((message.qos as u8) << 1);
        if message.dup {
            header |= 0x08;
        }
        if message.retained {
            header |= 0x01;
        }
        self.send_packet(header, &body)
    }

    /// Subscribe to a topic filter and register `handler` for it.
    ///
    /// Waits for the SUBACK; the handler is only registered once the broker
    /// has granted the subscription.
    ///
    /// # Errors
    ///
    /// * [`Error::NotOpen`] - The session is not connected
    /// * [`Error::BufferOverflow`] - Too many subscriptions, or filter too long
    /// * [`Error::ConnectionRefused`] - The broker rejected the subscription
    /// * [`Error::ProtocolError`] - Invalid SUBACK packet
    pub fn subscribe(
        &mut self,
        filter: &str,
        qos: QoS,
        handler: &'h dyn MessageHandler,
    ) -> Result<(), Error> {
        self.ensure_connected()?;
        let stored = String::try_from(filter).map_err(|_| Error::BufferOverflow)?;
        if self.subscriptions.is_full() && self.find(filter).is_none() {
            return Err(Error::BufferOverflow);
        }

        let packet_id = self.take_packet_id();
        let mut body: Vec<u8, TX_BUFFER_SIZE> = Vec::new();
        put(&mut body, &packet_id.to_be_bytes())?;
        put_bytes(&mut body, filter.as_bytes())?;
        put(&mut body, &[qos as u8])?;

        self.send_packet(SUBSCRIBE, &body)?;
        self.wait_for(SUBACK)?;

        if self.rx.len() != 3 || u16::from_be_bytes([self.rx[0], self.rx[1]]) != packet_id {
            return Err(Error::ProtocolError);
        }
        if self.rx[2] == 0x80 {
            return Err(Error::ConnectionRefused);
        }

        match self.find(filter) {
            Some(index) => self.subscriptions[index].handler = Some(handler),
            None => {
                let _ = self.subscriptions.push(Subscription {
                    filter: stored,
                    handler: Some(handler),
                });
            }
        }
        Ok(())
    }

    /// Unsubscribe from a topic filter and drop its handler.
    pub fn unsubscribe(&mut self, filter: &str) -> Result<(), Error> {
        self.ensure_connected()?;

        let packet_id = self.take_packet_id();
        let mut body: Vec<u8, TX_BUFFER_SIZE> = Vec::new();
        put(&mut body, &packet_id.to_be_bytes())?;
        put_bytes(&mut body, filter.as_bytes())?;

        self.send_packet(UNSUBSCRIBE, &body)?;
        self.wait_for(UNSUBACK)?;

        if self.rx.len() != 2 || u16::from_be_bytes([self.rx[0], self.rx[1]]) != packet_id {
            return Err(Error::ProtocolError);
        }
        if let Some(index) = self.find(filter) {
            self.subscriptions.swap_remove(index);
        }
        Ok(())
    }

    /// Detach the handler for `filter` without talking to the broker.
    ///
    /// Messages matching the filter are read and dropped afterwards.
    pub fn clear_message_handler(&mut self, filter: &str) {
        if let Some(index) = self.find(filter) {
            self.subscriptions[index].handler = None;
        }
    }

    /// Service the session for up to `timeout_ms` milliseconds.
    ///
    /// Reads inbound packets, dispatches PUBLISH messages to their handlers
    /// synchronously and sends PINGREQ when the keepalive interval elapses.
    ///
    /// # Errors
    ///
    /// Any transport failure, or a PINGRESP that did not arrive within one
    /// keepalive interval. The session is marked disconnected in both cases.
    pub fn yield_for(&mut self, timeout_ms: u32) -> Result<(), Error> {
        self.ensure_connected()?;
        let deadline = self.clock.now_ms() + u64::from(timeout_ms);
        loop {
            self.keep_alive()?;
            if let Some(header) = self.read_packet()? {
                self.dispatch(header)?;
            }
            if self.clock.now_ms() >= deadline {
                return Ok(());
            }
        }
    }

    /// Send DISCONNECT and mark the session closed.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.ensure_connected()?;
        let result = self.send_packet(DISCONNECT, &[]);
        self.is_connected = false;
        result
    }

    /// Release the session and hand back the underlying connection.
    pub fn close(self) -> C {
        self.connection
    }

    fn ensure_connected(&self) -> Result<(), Error> {
        if self.is_connected {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    fn find(&self, filter: &str) -> Option<usize> {
        self.subscriptions
            .iter()
            .position(|s| s.filter.as_str() == filter)
    }

    fn take_packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = match id {
            u16::MAX => 1,
            n => n + 1,
        };
        id
    }

    fn keep_alive(&mut self) -> Result<(), Error> {
        if self.keep_alive_ms == 0 {
            return Ok(());
        }
        let now = self.clock.now_ms();
        match self.ping_sent_ms {
            Some(sent) if now.saturating_sub(sent) >= self.keep_alive_ms => {
                log::warn!("no PINGRESP within {} ms", self.keep_alive_ms);
                self.is_connected = false;
                Err(Error::Timeout)
            }
            Some(_) => Ok(()),
            None if now.saturating_sub(self.last_sent_ms) >= self.keep_alive_ms => {
                self.send_packet(PINGREQ, &[])?;
                self.ping_sent_ms = Some(now);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Read packets until one of type `expected` arrives, dispatching others.
    fn wait_for(&mut self, expected: u8) -> Result<(), Error> {
        let deadline = self.clock.now_ms() + COMMAND_TIMEOUT_MS;
        loop {
            if let Some(header) = self.read_packet()? {
                if header & 0xF0 == expected {
                    return Ok(());
                }
                self.dispatch(header)?;
            }
            if self.clock.now_ms() >= deadline {
                return Err(Error::Timeout);
            }
        }
    }

    fn dispatch(&mut self, header: u8) -> Result<(), Error> {
        match header & 0xF0 {
            PUBLISH => self.deliver(header),
            PINGRESP => {
                self.ping_sent_ms = None;
                Ok(())
            }
            other => {
                log::debug!("ignoring packet type {:#04x}", other);
                Ok(())
            }
        }
    }

    fn deliver(&mut self, header: u8) -> Result<(), Error> {
        let ack = {
            let data = parse_publish(header, &self.rx)?;
            let handler = self
                .subscriptions
                .iter()
                .find(|s| topic_matches(&s.filter, data.topic))
                .and_then(|s| s.handler);
            match handler {
                Some(handler) => handler.on_message(&data),
                None => log::debug!("no handler for topic {}", data.topic),
            }
            (data.message.qos == QoS::AtLeastOnce).then_some(data.message.id)
        };

        if let Some(id) = ack {
            self.send_packet(PUBACK, &id.to_be_bytes())?;
        }
        Ok(())
    }

    /// Read one packet into `rx`, returning its fixed header byte.
    ///
    /// `Ok(None)` when no data is available or the packet was too large and
    /// has been discarded.
    fn read_packet(&mut self) -> Result<Option<u8>, Error> {
        let mut header = [0u8; 1];
        match self.connection.read(&mut header) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            Err(_) => return Err(self.lost(Error::ReadError)),
        }

        let mut remaining_len = 0usize;
        let mut multiplier = 1usize;
        for i in 0..4 {
            let mut byte = [0u8; 1];
            self.read_exact(&mut byte)?;
            remaining_len += usize::from(byte[0] & 127) * multiplier;
            if byte[0] & 0x80 == 0 {
                break;
            }
            if i == 3 {
                return Err(self.lost(Error::ProtocolError));
            }
            multiplier *= 128;
        }

        self.rx.clear();
        if remaining_len > RX_BUFFER_SIZE {
            log::warn!(
                "discarding {} byte packet (type {:#04x}), larger than the receive buffer",
                remaining_len,
                header[0] & 0xF0
            );
            self.discard(remaining_len)?;
            return Ok(None);
        }

        // The length check above keeps this within capacity.
        let _ = self.rx.resize(remaining_len, 0);
        let mut filled = 0;
        let mut stalls = 0;
        while filled < remaining_len {
            match self.connection.read(&mut self.rx[filled..]) {
                Ok(0) => {
                    stalls += 1;
                    if stalls > MAX_STALLS {
                        return Err(self.lost(Error::Timeout));
                    }
                }
                Ok(n) => filled += n,
                Err(_) => return Err(self.lost(Error::ReadError)),
            }
        }
        Ok(Some(header[0]))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        let mut stalls = 0;
        while filled < buf.len() {
            match self.connection.read(&mut buf[filled..]) {
                Ok(0) => {
                    stalls += 1;
                    if stalls > MAX_STALLS {
                        return Err(self.lost(Error::Timeout));
                    }
                }
                Ok(n) => filled += n,
                Err(_) => return Err(self.lost(Error::ReadError)),
            }
        }
        Ok(())
    }

    fn discard(&mut self, mut len: usize) -> Result<(), Error> {
        let mut scratch = [0u8; 64];
        while len > 0 {
            let chunk = len.min(scratch.len());
            self.read_exact(&mut scratch[..chunk])?;
            len -= chunk;
        }
        Ok(())
    }

    fn send_packet(&mut self, header: u8, body: &[u8]) -> Result<(), Error> {
        let mut fixed_header: Vec<u8, 5> = Vec::new();
        fixed_header.push(header).map_err(|_| Error::BufferOverflow)?;
        encode_remaining_length(&mut fixed_header, body.len())
            .map_err(|_| Error::ProtocolError)?;

        self.write_all(&fixed_header)?;
        self.write_all(body)?;
        if self.connection.flush().is_err() {
            return Err(self.lost(Error::WriteError));
        }
        self.last_sent_ms = self.clock.now_ms();
        Ok(())
    }

    fn write_all(&mut self, mut buf: &[u8]) -> Result<(), Error> {
        while !buf.is_empty() {
            match self.connection.write(buf) {
                Ok(0) | Err(_) => return Err(self.lost(Error::WriteError)),
                Ok(n) => buf = &buf[n..],
            }
        }
        Ok(())
    }

    fn lost(&mut self, error: Error) -> Error {
        self.is_connected = false;
        error
    }
}

/// Whether `topic` matches the subscription `filter`, honouring the `+` and
/// `#` wildcards.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

fn put<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    buf.extend_from_slice(bytes)
        .map_err(|_| Error::BufferOverflow)
}

/// Append a length-prefixed string or binary field.
fn put_bytes<const N: usize>(buf: &mut Vec<u8, N>, bytes: &[u8]) -> Result<(), Error> {
    let len = u16::try_from(bytes.len()).map_err(|_| Error::BufferOverflow)?;
    put(buf, &len.to_be_bytes())?;
    put(buf, bytes)
}

fn parse_publish(header: u8, body: &[u8]) -> Result<MessageData<'_>, Error> {
    let qos = QoS::from_bits((header >> 1) & 0x03)?;
    let mut cursor = 0;
    let topic = read_str(body, &mut cursor)?;
    let id = if qos == QoS::AtMostOnce {
        0
    } else {
        let bytes = body.get(cursor..cursor + 2).ok_or(Error::ProtocolError)?;
        cursor += 2;
        u16::from_be_bytes([bytes[0], bytes[1]])
    };
    Ok(MessageData {
        topic,
        message: Message {
            qos,
            retained: header & 0x01 != 0,
            dup: header & 0x08 != 0,
            id,
            payload: &body[cursor..],
        },
    })
}

fn read_str<'a>(buf: &'a [u8], cursor: &mut usize) -> Result<&'a str, Error> {
    let len_bytes = buf.get(*cursor..*cursor + 2).ok_or(Error::ProtocolError)?;
    let len = usize::from(u16::from_be_bytes([len_bytes[0], len_bytes[1]]));
    *cursor += 2;
    let bytes = buf.get(*cursor..*cursor + len).ok_or(Error::ProtocolError)?;
    *cursor += len;
    core::str::from_utf8(bytes).map_err(|_| Error::ProtocolError)
}

/// Encode the remaining length field for an MQTT packet.
///
/// Each byte carries 7 bits of the length; the high bit marks a continuation.
/// At most four bytes are used (up to 268,435,455).
fn encode_remaining_length(buf: &mut Vec<u8, 5>, mut len: usize) -> Result<(), ()> {
    for _ in 0..4 {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| ())?;
        if len == 0 {
            return Ok(());
        }
    }
    Err(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_length_boundaries() {
        let cases: [(usize, &[u8]); 4] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (16_383, &[0xFF, 0x7F]),
        ];
        for (len, expected) in cases {
            let mut buf: Vec<u8, 5> = Vec::new();
            encode_remaining_length(&mut buf, len).unwrap();
            assert_eq!(&buf[..], expected, "length {}", len);
        }
    }

    #[test]
    fn remaining_length_too_large() {
        let mut buf: Vec<u8, 5> = Vec::new();
        assert!(encode_remaining_length(&mut buf, 268_435_456).is_err());
    }

    #[test]
    fn publish_body_parsing() {
        let body = [0x00, 0x03, b'a', b'/', b'b', 0x00, 0x07, b'h', b'i'];
        let data = parse_publish(PUBLISH | 0x02 | 0x01, &body).unwrap();
        assert_eq!(data.topic, "a/b");
        assert_eq!(data.message.qos, QoS::AtLeastOnce);
        assert!(data.message.retained);
        assert_eq!(data.message.id, 7);
        assert_eq!(data.message.payload, b"hi");

        assert_eq!(parse_publish(PUBLISH, &[0x00, 0x09, b'a']), Err(Error::ProtocolError));
    }

    #[test]
    fn wildcard_matching() {
        assert!(topic_matches("a/b", "a/b"));
        assert!(!topic_matches("a/b", "a/c"));
        assert!(topic_matches("a/+/c", "a/x/c"));
        assert!(!topic_matches("a/+", "a/x/c"));
        assert!(topic_matches("a/#", "a/x/c"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("a/b/c", "a/b"));
    }
}
