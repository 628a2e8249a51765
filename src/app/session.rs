//! MQTT session capability and the state the main loop shares with it.

use crate::app::config::Config;
use crate::app::error::Error;
use crate::network::application::mqtt::{
    Client, Message, MessageData, MessageHandler, Options, QoS,
};
use crate::network::error::Error as NetError;
use crate::network::Connection;
use crate::system::clock::Monotonic;
use crate::system::signal::Flag;
use core::cell::{Ref, RefCell};
use core::fmt::Write as _;
use heapless::String;

/// Capacity of the message buffer, terminating NUL included.
pub const MESSAGE_BUFFER_SIZE: usize = 1024;
/// Capacity of an outgoing payload.
pub const PUBLISH_BUFFER_SIZE: usize = 128;

/// What the firmware needs from an MQTT session.
///
/// [`Client`] is the production implementation; tests substitute their own.
pub trait Session<'h> {
    /// Transport handed back by [`close`](Session::close).
    type Connection: Connection;

    /// Subscribes and registers `handler` for `topic`.
    fn subscribe(
        &mut self,
        topic: &str,
        qos: QoS,
        handler: &'h dyn MessageHandler,
    ) -> Result<(), NetError>;
    /// Unsubscribes from `topic`.
    fn unsubscribe(&mut self, topic: &str) -> Result<(), NetError>;
    /// Drops the handler for `topic`.
    fn clear_message_handler(&mut self, topic: &str);
    /// Services inbound traffic and keepalive for up to `timeout_ms`.
    fn yield_for(&mut self, timeout_ms: u32) -> Result<(), NetError>;
    /// Liveness as last observed.
    fn is_connected(&self) -> bool;
    /// Publishes `message` on `topic`.
    fn publish(&mut self, topic: &str, message: &Message<'_>) -> Result<(), NetError>;
    /// Sends the protocol-level goodbye.
    fn disconnect(&mut self) -> Result<(), NetError>;
    /// Releases the session, returning its transport.
    fn close(self) -> Self::Connection;
}

impl<'h, C: Connection, M: Monotonic> Session<'h> for Client<'h, C, M> {
    type Connection = C;

    fn subscribe(
        &mut self,
        topic: &str,
        qos: QoS,
        handler: &'h dyn MessageHandler,
    ) -> Result<(), NetError> {
        Client::subscribe(self, topic, qos, handler)
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), NetError> {
        Client::unsubscribe(self, topic)
    }

    fn clear_message_handler(&mut self, topic: &str) {
        Client::clear_message_handler(self, topic)
    }

    fn yield_for(&mut self, timeout_ms: u32) -> Result<(), NetError> {
        Client::yield_for(self, timeout_ms)
    }

    fn is_connected(&self) -> bool {
        Client::is_connected(self)
    }

    fn publish(&mut self, topic: &str, message: &Message<'_>) -> Result<(), NetError> {
        Client::publish(self, topic, message)
    }

    fn disconnect(&mut self) -> Result<(), NetError> {
        Client::disconnect(self)
    }

    fn close(self) -> C {
        Client::close(self)
    }
}

/// MQTT handshake with the configured identity. One attempt.
pub fn establish<'h, C, M>(
    connection: C,
    clock: M,
    config: &Config<'_>,
) -> Result<Client<'h, C, M>, Error>
where
    C: Connection,
    M: Monotonic,
{
    log::info!("MQTT client is connecting to the service ...");
    let options = Options {
        client_id: config.device_id,
        username: Some(config.username),
        password: Some(config.password),
        keep_alive_seconds: config.keep_alive_seconds,
        clean_session: true,
    };
    let client = Client::connect(connection, clock, options).map_err(|e| {
        log::error!("ERROR: rc from MQTT connect is {:?}", e);
        Error::MqttConnect(e)
    })?;
    log::info!("Client connected.");
    Ok(client)
}

/// Subscribes `inbox` to `topic` at QoS 0.
pub fn subscribe<'h, S: Session<'h>>(
    session: &mut S,
    topic: &str,
    inbox: &'h Inbox,
) -> Result<(), Error> {
    log::info!("Client is trying to subscribe a topic \"{}\".", topic);
    session
        .subscribe(topic, QoS::AtMostOnce, inbox)
        .map_err(|e| {
            log::error!("ERROR: rc from MQTT subscribe is {:?}", e);
            Error::Subscribe(e)
        })?;
    log::info!("Client has subscribed a topic \"{}\".", topic);
    Ok(())
}

/// The most recently received payload, NUL-terminated.
///
/// Holds at most `MESSAGE_BUFFER_SIZE - 1` payload bytes; longer payloads
/// are truncated.
pub struct MessageBuffer {
    bytes: [u8; MESSAGE_BUFFER_SIZE],
    len: usize,
}

impl MessageBuffer {
    /// Longest payload stored without truncation.
    pub const MAX_PAYLOAD: usize = MESSAGE_BUFFER_SIZE - 1;

    /// An empty buffer.
    pub const fn new() -> Self {
        Self {
            bytes: [0; MESSAGE_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Replaces the contents with `payload`. Returns `true` if it was
    /// truncated to fit.
    pub fn store(&mut self, payload: &[u8]) -> bool {
        let len = payload.len().min(Self::MAX_PAYLOAD);
        self.bytes[..len].copy_from_slice(&payload[..len]);
        self.bytes[len] = 0;
        self.len = len;
        len < payload.len()
    }

    /// Stored payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Stored payload followed by its NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes[..=self.len]
    }

    /// Number of payload bytes stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageBuffer").field("len", &self.len).finish()
    }
}

impl core::fmt::Display for MessageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(text) => f.write_str(text),
            Err(_) => write!(f, "{:02X?}", self.as_bytes()),
        }
    }
}

/// Message handler that keeps the latest payload and raises a flag.
///
/// Written from inside `yield`, read by the main loop body; both run on the
/// same thread.
#[derive(Debug, Default)]
pub struct Inbox {
    buffer: RefCell<MessageBuffer>,
    arrived: Flag,
}

impl Inbox {
    /// An empty inbox.
    pub const fn new() -> Self {
        Self {
            buffer: RefCell::new(MessageBuffer::new()),
            arrived: Flag::new(),
        }
    }

    /// If a message arrived since the last call, lowers the flag and returns
    /// the buffer.
    pub fn take(&self) -> Option<Ref<'_, MessageBuffer>> {
        self.arrived.take().then(|| self.buffer.borrow())
    }

    /// The "message arrived" signal.
    pub fn arrived(&self) -> &Flag {
        &self.arrived
    }
}

impl MessageHandler for Inbox {
    fn on_message(&self, data: &MessageData<'_>) {
        let payload = data.message.payload;
        if self.buffer.borrow_mut().store(payload) {
            log::warn!(
                "payload on {} truncated from {} to {} bytes",
                data.topic,
                payload.len(),
                MessageBuffer::MAX_PAYLOAD
            );
        }
        self.arrived.raise();
    }
}

/// Numbers button publishes.
///
/// The payload counter and the message id both start at 0 and advance by
/// one per publish attempt, whether or not the attempt succeeded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishCounter {
    count: u32,
    id: u16,
}

/// A numbered outgoing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// `Message #<count> from <device id>.`
    pub payload: String<PUBLISH_BUFFER_SIZE>,
    /// Message id.
    pub id: u16,
}

impl Outgoing {
    /// QoS 0, not retained, not a duplicate.
    pub fn message(&self) -> Message<'_> {
        Message {
            qos: QoS::AtMostOnce,
            retained: false,
            dup: false,
            id: self.id,
            payload: self.payload.as_bytes(),
        }
    }
}

impl PublishCounter {
    /// Starts at message #0, id 0.
    pub const fn new() -> Self {
        Self { count: 0, id: 0 }
    }

    /// Builds the next payload and advances.
    ///
    /// A payload that does not fit [`PUBLISH_BUFFER_SIZE`] ends before the
    /// piece that overflowed it.
    pub fn next(&mut self, device_id: &str) -> Outgoing {
        let mut payload = String::new();
        if write!(payload, "Message #{} from {}.", self.count, device_id).is_err() {
            log::warn!("publish payload truncated to {} bytes", payload.len());
        }
        let outgoing = Outgoing {
            payload,
            id: self.id,
        };
        self.count = self.count.wrapping_add(1);
        self.id = self.id.wrapping_add(1);
        outgoing
    }

    /// Publishes issued so far.
    pub fn count(&self) -> u32 {
        self.count
    }
}
