//! Round trip through a real broker. Needs network access:
//!
//! ```text
//! cargo test --features std --test live_broker -- --ignored
//! ```
//!
//! `TEST_MQTT_ADDRESS` (`host:port`, also read from `.env`) selects the
//! broker; the public test broker is used otherwise.
#![cfg(feature = "std")]

use dotenvy::dotenv;
use mqtt_button::app::session::{self, Inbox, PublishCounter};
use mqtt_button::app::{Config, transport};
use mqtt_button::network::Interface;
use mqtt_button::network::std::HostInterface;
use mqtt_button::system::clock::StdMonotonic;
use std::env;

#[test]
#[ignore]
fn test_publish_arrives_on_subscribed_topic() {
    dotenv().ok();
    let address = env::var("TEST_MQTT_ADDRESS").unwrap_or("test.mosquitto.org:1883".to_string());
    let (host, port) = address.rsplit_once(':').expect("host:port");
    let port: u16 = port.parse().expect("numeric port");

    let topic = "mqtt-button/live-test";
    let config = Config {
        broker_host: host,
        broker_port: port,
        device_id: "mqtt-button-live-test",
        pub_topic: topic,
        sub_topic: topic,
        ..Config::default()
    };

    let inbox = Inbox::new();
    let mut iface = HostInterface::new();
    iface.connect().expect("host network");

    let connection = transport::open_and_connect(&mut iface, config.broker_host, config.broker_port)
        .expect("broker reachable");
    let mut client = session::establish(connection, StdMonotonic::new(), &config).expect("CONNACK");
    session::subscribe(&mut client, config.sub_topic, &inbox).expect("SUBACK");

    let outgoing = PublishCounter::new().next(config.device_id);
    client.publish(config.pub_topic, &outgoing.message()).expect("publish");

    for _ in 0..50 {
        client.yield_for(100).expect("yield");
        if let Some(message) = inbox.take() {
            assert_eq!(message.as_bytes(), b"Message #0 from mqtt-button-live-test.");
            return;
        }
    }
    panic!("message did not come back within 5 s");
}
