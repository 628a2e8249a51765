//! The polling loop and the teardown that follows it.

use crate::app::config::Config;
use crate::app::connector::{self, CancelToken};
use crate::app::error::Error;
use crate::app::session::{self, Inbox, PublishCounter, Session};
use crate::app::{time_sync, transport};
use crate::network::error::Error as NetError;
use crate::network::{Close, Interface, TcpSocket};
use crate::peripherals::{Button, Leds};
use crate::system::clock::Monotonic;
use crate::system::signal::Flag;
use core::ops::ControlFlow;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;

/// Why the main loop stopped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitReason {
    /// The session reported itself disconnected at the top of an iteration.
    Disconnected,
    /// Servicing the session failed.
    YieldFailed(NetError),
}

/// The cooperative main loop.
///
/// One [`step`](MainLoop::step) is one iteration: heartbeat, liveness check,
/// yield, received-message handling, button publish, sleep.
pub struct MainLoop<'a, 'h, S, P, D> {
    session: S,
    leds: &'a mut Leds<P>,
    inbox: &'h Inbox,
    publish_requested: &'a Flag,
    delay: &'a mut D,
    pub_topic: &'a str,
    device_id: &'a str,
    yield_timeout_ms: u32,
    blink_interval_ms: u32,
    counter: PublishCounter,
}

impl<S, P, D> core::fmt::Debug for MainLoop<'_, '_, S, P, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MainLoop")
            .field("pub_topic", &self.pub_topic)
            .field("counter", &self.counter)
            .finish()
    }
}

impl<'a, 'h, S, P, D> MainLoop<'a, 'h, S, P, D>
where
    S: Session<'h>,
    P: StatefulOutputPin,
    D: DelayNs,
{
    /// Takes over a subscribed session.
    pub fn new(
        session: S,
        leds: &'a mut Leds<P>,
        inbox: &'h Inbox,
        publish_requested: &'a Flag,
        delay: &'a mut D,
        config: &'a Config<'_>,
    ) -> Self {
        Self {
            session,
            leds,
            inbox,
            publish_requested,
            delay,
            pub_topic: config.pub_topic,
            device_id: config.device_id,
            yield_timeout_ms: config.yield_timeout_ms,
            blink_interval_ms: config.blink_interval_ms,
            counter: PublishCounter::new(),
        }
    }

    /// Runs one iteration.
    pub fn step(&mut self) -> ControlFlow<ExitReason> {
        self.leds.tick();

        if !self.session.is_connected() {
            return ControlFlow::Break(ExitReason::Disconnected);
        }
        if let Err(e) = self.session.yield_for(self.yield_timeout_ms) {
            log::error!("yield failed: {:?}", e);
            return ControlFlow::Break(ExitReason::YieldFailed(e));
        }

        if let Some(message) = self.inbox.take() {
            log::info!("Message arrived:\n{}", &*message);
            let _ = self.leds.receive.on();
        }

        if self.publish_requested.take() {
            self.publish();
        }

        self.delay.delay_ms(self.blink_interval_ms);
        ControlFlow::Continue(())
    }

    /// Iterates until the session dies.
    pub fn run(&mut self) -> ExitReason {
        loop {
            if let ControlFlow::Break(reason) = self.step() {
                return reason;
            }
        }
    }

    /// Publishes issued so far.
    pub fn published(&self) -> u32 {
        self.counter.count()
    }

    /// Gives the session back for shutdown.
    pub fn into_session(self) -> S {
        self.session
    }

    fn publish(&mut self) {
        log::info!("button1 fire");
        let _ = self.leds.publish.on();

        let outgoing = self.counter.next(self.device_id);
        log::info!(
            "Publishing message to the topic {}:\n{}",
            self.pub_topic,
            outgoing.payload
        );
        if let Err(e) = self.session.publish(self.pub_topic, &outgoing.message()) {
            log::error!("ERROR: rc from MQTT publish is {:?}", e);
        }
        log::info!("Message published.");
    }
}

/// Tears the session down and closes its transport.
///
/// When `subscribed`, unsubscribes and drops the message handler. Then
/// disconnects if the session is still up, releases the session and closes
/// the connection. Each step is attempted regardless of earlier failures.
pub fn shutdown<'h, S: Session<'h>>(mut session: S, topic: &str, subscribed: bool) {
    if subscribed {
        match session.unsubscribe(topic) {
            Ok(()) => log::info!("Unsubscribed from \"{}\".", topic),
            Err(e) => log::warn!("ERROR: rc from MQTT unsubscribe is {:?}", e),
        }
        session.clear_message_handler(topic);
    }

    if session.is_connected() {
        match session.disconnect() {
            Ok(()) => log::info!("MQTT client disconnected."),
            Err(e) => log::warn!("ERROR: rc from MQTT disconnect is {:?}", e),
        }
    }

    let connection = session.close();
    match connection.close() {
        Ok(()) => log::debug!("socket closed"),
        Err(e) => log::warn!("socket close failed: {:?}", e),
    }
}

/// The whole program: bring-up, session, main loop, teardown.
///
/// Startup failures return early; every resource acquired up to that point
/// is released on the way out, the network interface last. A session that
/// dies in the main loop is shut down before returning its [`ExitReason`].
pub fn run<I, P, D, M>(
    iface: Option<I>,
    config: &Config<'_>,
    leds: &mut Leds<P>,
    button: &Button,
    cancel: &CancelToken,
    delay: &mut D,
    clock: M,
) -> Result<ExitReason, Error>
where
    I: Interface<Error = NetError>,
    I::TcpSocket: TcpSocket<Error = NetError>,
    P: StatefulOutputPin,
    D: DelayNs,
    M: Monotonic,
{
    // Outlives the session that holds a reference to it.
    let inbox = Inbox::new();

    let (mut network, _address) = connector::connect(iface, &config.retry, cancel, delay)?;
    time_sync::sync_time(&mut *network, config.ntp_server, config.ntp_port, &clock)?;
    let connection =
        transport::open_and_connect(&mut *network, config.broker_host, config.broker_port)?;

    let mut client = session::establish(connection, &clock, config)?;
    button.arm();

    if let Err(e) = session::subscribe(&mut client, config.sub_topic, &inbox) {
        shutdown(client, config.sub_topic, false);
        return Err(e);
    }

    let mut main_loop = MainLoop::new(
        client,
        leds,
        &inbox,
        button.publish_requested(),
        delay,
        config,
    );
    let reason = main_loop.run();
    log::info!("The client has disconnected.");

    shutdown(main_loop.into_session(), config.sub_topic, true);
    Ok(reason)
}
