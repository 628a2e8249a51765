use criterion::{BatchSize, Criterion, Throughput};
use mqtt_button::app::session::{Inbox, PublishCounter};
use mqtt_button::network::application::mqtt::{Client, Options, QoS};
use mqtt_button::network::error::Error;
use mqtt_button::network::{Close, Connection, Read, Write};
use mqtt_button::system::clock::Monotonic;
use std::cell::Cell;

const TOPIC: &str = "aaeon_lyd/gutc/from_broker";
const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];
const SUBACK: [u8; 5] = [0x90, 0x03, 0x00, 0x01, 0x00];

/// In-memory broker: plays a fixed script, then repeats its tail forever.
struct LoopbackConnection {
    script: Vec<u8>,
    pos: usize,
    replay_from: usize,
}

impl LoopbackConnection {
    fn new(script: Vec<u8>, replay_from: usize) -> Self {
        Self {
            script,
            pos: 0,
            replay_from,
        }
    }
}

impl Read for LoopbackConnection {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.pos == self.script.len() {
            if self.replay_from >= self.script.len() {
                return Ok(0);
            }
            self.pos = self.replay_from;
        }
        let len = buf.len().min(self.script.len() - self.pos);
        buf[..len].copy_from_slice(&self.script[self.pos..self.pos + len]);
        self.pos += len;
        Ok(len)
    }
}

impl Write for LoopbackConnection {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for LoopbackConnection {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for LoopbackConnection {}

#[derive(Default)]
struct Ticks(Cell<u64>);

impl Monotonic for Ticks {
    fn now_ms(&self) -> u64 {
        self.0.set(self.0.get() + 1);
        self.0.get()
    }
}

fn options() -> Options<'static> {
    Options {
        client_id: "JustForDemo",
        username: None,
        password: None,
        keep_alive_seconds: 60,
        clean_session: true,
    }
}

fn publish_packet(topic: &str, payload: &[u8]) -> Vec<u8> {
    let len = 2 + topic.len() + payload.len();
    assert!(len < 16_384);
    let mut packet = vec![0x30];
    if len < 128 {
        packet.push(len as u8);
    } else {
        packet.extend_from_slice(&[(len % 128) as u8 | 0x80, (len / 128) as u8]);
    }
    packet.extend_from_slice(&(topic.len() as u16).to_be_bytes());
    packet.extend_from_slice(topic.as_bytes());
    packet.extend_from_slice(payload);
    packet
}

pub fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    let outgoing = PublishCounter::new().next("JustForDemo");
    group.throughput(Throughput::Bytes(outgoing.payload.len() as u64));
    group.bench_function("publish_qos0", |b| {
        b.iter_batched_ref(
            || {
                let connection = LoopbackConnection::new(CONNACK.to_vec(), usize::MAX);
                Client::connect(connection, Ticks::default(), options()).expect("CONNACK")
            },
            |client| {
                client
                    .publish("aaeon_lyd/gutc/to_broker", &outgoing.message())
                    .expect("publish");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_yield_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("yield_dispatch");
    let inbox = Inbox::new();

    for size in [16usize, 256, 1_023] {
        let payload = vec![b'm'; size];
        group.throughput(Throughput::Bytes(size as u64 * 50));
        group.bench_function(format!("yield_{}", size), |b| {
            b.iter_batched_ref(
                || {
                    let mut script = CONNACK.to_vec();
                    script.extend_from_slice(&SUBACK);
                    let replay_from = script.len();
                    script.extend(publish_packet(TOPIC, &payload));
                    let connection = LoopbackConnection::new(script, replay_from);
                    let mut client =
                        Client::connect(connection, Ticks::default(), options()).expect("CONNACK");
                    client
                        .subscribe(TOPIC, QoS::AtMostOnce, &inbox)
                        .expect("SUBACK");
                    client
                },
                |client| {
                    for _ in 0..50 {
                        client.yield_for(0).expect("yield");
                        assert!(inbox.take().is_some());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

pub fn bench_payload_format(c: &mut Criterion) {
    c.bench_function("payload_format", |b| {
        let mut counter = PublishCounter::new();
        b.iter(|| counter.next("JustForDemo"))
    });
}
