//! Host build of the button demo.
//!
//! The host's default route stands in for the Ethernet interface and the
//! LEDs are logged at `trace` level. Press Enter (or type `p`) to "press"
//! the button, `q` to cancel a network bring-up that keeps failing.
//!
//! ```text
//! mqtt-button [config.json]
//! ```

use embedded_hal::delay::DelayNs;
use mqtt_button::app::connector::CancelToken;
use mqtt_button::app::{self, Config, ExitReason};
use mqtt_button::network::std::HostInterface;
use mqtt_button::peripherals::{Button, Leds, LogPin};
use mqtt_button::system::clock::StdMonotonic;
use std::io::BufRead;
use std::time::Duration;
use std::{env, fs, process, thread};

static BUTTON: Button = Button::new();
static CANCEL: CancelToken = CancelToken::new();

struct Sleep;

impl DelayNs for Sleep {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Feeds console lines to the button and cancel token, the way the board's
/// interrupt handlers would.
fn spawn_console() {
    thread::spawn(|| {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "" | "p" => BUTTON.on_rise(),
                "q" => CANCEL.cancel(),
                other => log::warn!("unknown command {:?} (Enter/p: press, q: cancel)", other),
            }
        }
    });
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let text = match env::args().nth(1) {
        Some(path) => match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("cannot read {}: {}", path, e);
                process::exit(-1);
            }
        },
        None => None,
    };
    let config = match text.as_deref().map(Config::from_json) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            log::error!("{}", e);
            process::exit(app::Error::from(e).exit_code());
        }
        None => Config::default(),
    };

    spawn_console();

    let mut leds = Leds::new(LogPin::new("red"), LogPin::new("green"), LogPin::new("blue"));
    let result = app::run(
        Some(HostInterface::new()),
        &config,
        &mut leds,
        &BUTTON,
        &CANCEL,
        &mut Sleep,
        StdMonotonic::new(),
    );

    match result {
        Ok(ExitReason::Disconnected) => log::info!("session closed by the broker"),
        Ok(ExitReason::YieldFailed(e)) => log::info!("session lost: {}", e),
        Err(e) => {
            log::error!("{}", e);
            process::exit(e.exit_code());
        }
    }
}
