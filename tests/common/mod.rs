#![allow(dead_code)]

use mqtt_button::network::application::mqtt::{Message, MessageData, MessageHandler, QoS};
use mqtt_button::network::error::Error;
use mqtt_button::network::{Close, Connection, Interface, Read, TcpSocket, UdpSocket, Write};
use mqtt_button::system::clock::Monotonic;
use embedded_hal::delay::DelayNs;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::rc::Rc;

pub const BROKER_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
pub const LOCAL_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 17));
pub const NTP_UNIX_OFFSET: u32 = 2_208_988_800;

/// Ordered record of side effects, shared between mocks and the test.
#[derive(Clone, Default, Debug)]
pub struct Events(Rc<RefCell<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.borrow_mut().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.count(event) > 0
    }
}

/// Shared mock time, advanced by clock reads and sleeps.
#[derive(Clone, Default, Debug)]
pub struct Time(Rc<Cell<u64>>);

impl Time {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

/// A monotonic clock that moves forward by `step` on every read.
#[derive(Debug)]
pub struct StepClock {
    pub time: Time,
    pub step: u64,
}

impl StepClock {
    pub fn new(time: &Time) -> Self {
        Self {
            time: time.clone(),
            step: 10,
        }
    }
}

impl Monotonic for StepClock {
    fn now_ms(&self) -> u64 {
        self.time.advance(self.step);
        self.time.now()
    }
}

/// Both ends of a mock stream connection.
#[derive(Debug, Default)]
pub struct Wire {
    /// Chunks the connection yields, each readable from the given time.
    pub inbound: VecDeque<(u64, Vec<u8>)>,
    /// Everything written.
    pub outbound: Vec<u8>,
    /// Reads fail once the inbound queue is drained and this time is reached.
    pub eof_at: Option<u64>,
    /// Set by `Close::close`.
    pub closed: bool,
}

impl Wire {
    pub fn push(&mut self, at: u64, bytes: &[u8]) {
        self.inbound.push_back((at, bytes.to_vec()));
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    pub wire: Rc<RefCell<Wire>>,
    pub time: Time,
    pub events: Events,
}

impl ScriptedConnection {
    pub fn new(time: &Time, events: &Events) -> Self {
        Self {
            wire: Rc::new(RefCell::new(Wire::default())),
            time: time.clone(),
            events: events.clone(),
        }
    }

    pub fn with_wire(wire: &Rc<RefCell<Wire>>, time: &Time, events: &Events) -> Self {
        Self {
            wire: wire.clone(),
            time: time.clone(),
            events: events.clone(),
        }
    }
}

impl Read for ScriptedConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let now = self.time.now();
        let mut wire = self.wire.borrow_mut();
        let Some(at) = wire.inbound.front().map(|(at, _)| *at) else {
            return match wire.eof_at {
                Some(eof) if eof <= now => Err(Error::ConnectionClosed),
                _ => Ok(0),
            };
        };
        if at > now {
            return Ok(0);
        }
        let chunk = &mut wire.inbound[0].1;
        let len = buf.len().min(chunk.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        chunk.drain(..len);
        if chunk.is_empty() {
            wire.inbound.pop_front();
        }
        Ok(len)
    }
}

impl Write for ScriptedConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.wire.borrow_mut().outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for ScriptedConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.wire.borrow_mut().closed = true;
        self.events.push("socket close");
        Ok(())
    }
}

impl Connection for ScriptedConnection {}

/// A network interface whose every phase can be made to fail.
#[derive(Debug, Default)]
pub struct MockInterface {
    pub events: Events,
    pub time: Time,
    pub wire: Rc<RefCell<Wire>>,
    /// Fail this many `connect` calls before succeeding.
    pub connect_failures: u32,
    /// Fail this many `ip_address` calls before succeeding.
    pub address_failures: u32,
    pub dns_fails: bool,
    pub open_tcp_fails: bool,
    pub tcp_connect_fails: bool,
    pub open_udp_fails: bool,
    /// NTP-era transmit seconds the time server answers with.
    pub ntp_seconds: u32,
}

impl MockInterface {
    pub fn new(events: &Events, time: &Time) -> Self {
        Self {
            events: events.clone(),
            time: time.clone(),
            ntp_seconds: 1_700_000_000 + NTP_UNIX_OFFSET,
            ..Default::default()
        }
    }
}

impl Interface for MockInterface {
    type Error = Error;
    type TcpSocket = MockTcpSocket;
    type UdpSocket = MockUdpSocket;

    fn connect(&mut self) -> Result<(), Self::Error> {
        self.events.push("connect");
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(Error::Timeout);
        }
        Ok(())
    }

    fn ip_address(&mut self) -> Result<IpAddr, Self::Error> {
        self.events.push("ip_address");
        if self.address_failures > 0 {
            self.address_failures -= 1;
            return Err(Error::NotOpen);
        }
        Ok(LOCAL_ADDRESS)
    }

    fn get_host_by_name(&mut self, host: &str) -> Result<IpAddr, Self::Error> {
        self.events.push(format!("resolve {}", host));
        if self.dns_fails {
            return Err(Error::Dns);
        }
        Ok(BROKER_ADDRESS)
    }

    fn open_tcp(&mut self) -> Result<Self::TcpSocket, Self::Error> {
        self.events.push("open_tcp");
        if self.open_tcp_fails {
            return Err(Error::NotOpen);
        }
        Ok(MockTcpSocket {
            events: self.events.clone(),
            time: self.time.clone(),
            wire: self.wire.clone(),
            fails: self.tcp_connect_fails,
        })
    }

    fn open_udp(&mut self) -> Result<Self::UdpSocket, Self::Error> {
        self.events.push("open_udp");
        if self.open_udp_fails {
            return Err(Error::NotOpen);
        }
        Ok(MockUdpSocket {
            events: self.events.clone(),
            seconds: self.ntp_seconds,
            server: None,
        })
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        self.events.push("disconnect");
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockTcpSocket {
    events: Events,
    time: Time,
    wire: Rc<RefCell<Wire>>,
    fails: bool,
}

impl TcpSocket for MockTcpSocket {
    type Connection = ScriptedConnection;
    type Error = Error;

    fn connect(self, remote: SocketAddr) -> Result<Self::Connection, Self::Error> {
        self.events.push(format!("tcp_connect {}", remote));
        if self.fails {
            return Err(Error::ConnectionRefused);
        }
        Ok(ScriptedConnection::with_wire(&self.wire, &self.time, &self.events))
    }
}

/// A time server that answers every request once.
#[derive(Debug)]
pub struct MockUdpSocket {
    events: Events,
    seconds: u32,
    server: Option<SocketAddr>,
}

impl Drop for MockUdpSocket {
    fn drop(&mut self) {
        self.events.push("udp close");
    }
}

impl UdpSocket for MockUdpSocket {
    type Error = Error;

    fn send_to(&mut self, remote: SocketAddr, buf: &[u8]) -> Result<usize, Self::Error> {
        self.events.push(format!("ntp request {}", remote));
        assert_eq!(buf[0], 0x1B);
        self.server = Some(remote);
        Ok(buf.len())
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Self::Error> {
        let server = self.server.take().ok_or(Error::Timeout)?;
        buf[..48].fill(0);
        buf[0] = 0x24;
        buf[40..44].copy_from_slice(&self.seconds.to_be_bytes());
        Ok((48, server))
    }
}

/// Records sleeps, advances mock time and runs a hook on every sleep.
pub struct RecordingDelay<'a> {
    pub sleeps: Vec<u32>,
    pub time: Option<Time>,
    pub on_sleep: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> RecordingDelay<'a> {
    pub fn new() -> Self {
        Self {
            sleeps: Vec::new(),
            time: None,
            on_sleep: None,
        }
    }

    pub fn advancing(time: &Time) -> Self {
        Self {
            time: Some(time.clone()),
            ..Self::new()
        }
    }

    pub fn with_hook(mut self, hook: impl FnMut() + 'a) -> Self {
        self.on_sleep = Some(Box::new(hook));
        self
    }
}

impl DelayNs for RecordingDelay<'_> {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.push(ms);
        if let Some(time) = &self.time {
            time.advance(u64::from(ms));
        }
        if let Some(hook) = self.on_sleep.as_mut() {
            hook();
        }
    }
}

/// What one `yield_for` call on a [`MockSession`] does.
#[derive(Debug, Clone)]
pub enum YieldAction {
    Idle,
    Deliver(Vec<u8>),
    Fail(Error),
    Drop,
}

/// A session that records calls instead of speaking MQTT.
pub struct MockSession<'h> {
    pub events: Events,
    pub connected: bool,
    pub script: VecDeque<YieldAction>,
    pub published: Vec<(String, Vec<u8>, u16)>,
    pub publish_fails: bool,
    topic: String,
    handler: Option<&'h dyn MessageHandler>,
    connection: ScriptedConnection,
}

impl<'h> MockSession<'h> {
    pub fn new(events: &Events, time: &Time) -> Self {
        Self {
            events: events.clone(),
            connected: true,
            script: VecDeque::new(),
            published: Vec::new(),
            publish_fails: false,
            topic: String::new(),
            handler: None,
            connection: ScriptedConnection::new(time, events),
        }
    }
}

impl<'h> mqtt_button::app::session::Session<'h> for MockSession<'h> {
    type Connection = ScriptedConnection;

    fn subscribe(
        &mut self,
        topic: &str,
        _qos: QoS,
        handler: &'h dyn MessageHandler,
    ) -> Result<(), Error> {
        self.events.push("subscribe");
        self.topic = topic.to_string();
        self.handler = Some(handler);
        Ok(())
    }

    fn unsubscribe(&mut self, _topic: &str) -> Result<(), Error> {
        self.events.push("unsubscribe");
        if self.connected { Ok(()) } else { Err(Error::NotOpen) }
    }

    fn clear_message_handler(&mut self, _topic: &str) {
        self.events.push("clear handler");
        self.handler = None;
    }

    fn yield_for(&mut self, _timeout_ms: u32) -> Result<(), Error> {
        self.events.push("yield");
        match self.script.pop_front().unwrap_or(YieldAction::Idle) {
            YieldAction::Idle => Ok(()),
            YieldAction::Deliver(payload) => {
                if let Some(handler) = self.handler {
                    handler.on_message(&MessageData {
                        topic: &self.topic,
                        message: Message {
                            qos: QoS::AtMostOnce,
                            retained: false,
                            dup: false,
                            id: 0,
                            payload: &payload,
                        },
                    });
                }
                Ok(())
            }
            YieldAction::Fail(e) => Err(e),
            YieldAction::Drop => {
                self.connected = false;
                Ok(())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, message: &Message<'_>) -> Result<(), Error> {
        self.events.push("publish");
        assert_eq!(message.qos, QoS::AtMostOnce);
        assert!(!message.retained);
        assert!(!message.dup);
        self.published
            .push((topic.to_string(), message.payload.to_vec(), message.id));
        if self.publish_fails { Err(Error::WriteError) } else { Ok(()) }
    }

    fn disconnect(&mut self) -> Result<(), Error> {
        self.events.push("disconnect");
        self.connected = false;
        Ok(())
    }

    fn close(self) -> ScriptedConnection {
        self.events.push("release");
        self.connection
    }
}

/// MQTT packet helpers.
pub mod packets {
    pub const CONNACK_OK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

    pub fn suback(packet_id: u16) -> Vec<u8> {
        let id = packet_id.to_be_bytes();
        vec![0x90, 0x03, id[0], id[1], 0x00]
    }

    pub fn unsuback(packet_id: u16) -> Vec<u8> {
        let id = packet_id.to_be_bytes();
        vec![0xB0, 0x02, id[0], id[1]]
    }

    pub fn remaining_length(mut len: usize) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (len % 128) as u8;
            len /= 128;
            if len > 0 {
                byte |= 0x80;
            }
            out.push(byte);
            if len == 0 {
                return out;
            }
        }
    }

    /// A QoS 0 PUBLISH.
    pub fn publish(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(topic.len() as u16).to_be_bytes());
        body.extend_from_slice(topic.as_bytes());
        body.extend_from_slice(payload);
        let mut packet = vec![0x30];
        packet.extend(remaining_length(body.len()));
        packet.extend(body);
        packet
    }

    /// Whether `needle` occurs in `haystack`.
    pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }
}
