//! Board peripherals: three status LEDs and the publish button.
//!
//! LEDs are driven through `embedded-hal` output pins and are active-low, so
//! "on" drives the pin low. The button is an edge source: its rising-edge
//! handler only raises a [`Flag`] and never blocks.

use crate::system::signal::Flag;
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};

/// Pin level that lights an LED.
pub const LED_ON: PinState = PinState::Low;
/// Pin level that darkens an LED.
pub const LED_OFF: PinState = PinState::High;

/// An active-low LED.
#[derive(Debug)]
pub struct Led<P> {
    pin: P,
}

impl<P: StatefulOutputPin> Led<P> {
    /// Wraps a pin. The LED state is left as the pin currently drives it.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Lights the LED.
    pub fn on(&mut self) -> Result<(), P::Error> {
        self.pin.set_state(LED_ON)
    }

    /// Darkens the LED.
    pub fn off(&mut self) -> Result<(), P::Error> {
        self.pin.set_state(LED_OFF)
    }

    /// Flips the LED.
    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.pin.toggle()
    }

    /// Whether the LED is lit.
    pub fn is_on(&mut self) -> Result<bool, P::Error> {
        self.pin.is_set_low()
    }

    /// Gives the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

/// The three status LEDs.
///
/// - heartbeat (red on the reference board): toggled every loop iteration
/// - receive (green): lit for one iteration after a message arrived
/// - publish (blue): lit for one iteration after a button publish
#[derive(Debug)]
pub struct Leds<P> {
    /// Liveness blink.
    pub heartbeat: Led<P>,
    /// Message-arrived indicator.
    pub receive: Led<P>,
    /// Message-published indicator.
    pub publish: Led<P>,
}

impl<P: StatefulOutputPin> Leds<P> {
    /// Wraps the three pins.
    pub fn new(heartbeat: P, receive: P, publish: P) -> Self {
        Self {
            heartbeat: Led::new(heartbeat),
            receive: Led::new(receive),
            publish: Led::new(publish),
        }
    }

    /// Start-of-iteration update: flip the heartbeat, clear both indicators.
    ///
    /// LED writes have no read-back contract, so pin errors are dropped.
    pub fn tick(&mut self) {
        let _ = self.heartbeat.toggle();
        let _ = self.receive.off();
        let _ = self.publish.off();
    }
}

/// The publish button.
///
/// Until [`arm`](Button::arm) is called, edges are ignored, matching a board
/// whose interrupt is only attached once the MQTT session is up.
#[derive(Debug)]
pub struct Button {
    armed: AtomicBool,
    publish_requested: Flag,
}

impl Button {
    /// Creates a disarmed button. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            publish_requested: Flag::new(),
        }
    }

    /// Attaches the rising-edge handler.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Rising-edge handler. Interrupt-safe.
    pub fn on_rise(&self) {
        if self.armed.load(Ordering::Acquire) {
            self.publish_requested.raise();
        }
    }

    /// The "publish requested" signal consumed by the main loop.
    pub fn publish_requested(&self) -> &Flag {
        &self.publish_requested
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new()
    }
}

/// An output pin that only records and logs its level.
///
/// Stands in for board LEDs when running on a host.
#[derive(Debug)]
pub struct LogPin {
    name: &'static str,
    high: bool,
}

impl LogPin {
    /// A pin starting high, i.e. an unlit active-low LED.
    pub const fn new(name: &'static str) -> Self {
        Self { name, high: true }
    }

    fn set(&mut self, high: bool) {
        if self.high != high {
            log::trace!("{} {}", self.name, if high { "off" } else { "on" });
        }
        self.high = high;
    }
}

impl ErrorType for LogPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for LogPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}
