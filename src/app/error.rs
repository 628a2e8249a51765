//! Startup failures and how they end the process.

use crate::app::config::ConfigError;
use crate::network::error::Error as NetError;

/// Why the firmware could not reach its main loop.
///
/// Loop-terminating conditions (session lost, yield failure) are not errors;
/// they are reported as [`ExitReason`](crate::app::runner::ExitReason) after a
/// graceful shutdown.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// No network interface is available.
    NoInterface,
    /// The interface could not be brought up before the retry policy gave up.
    NetworkUnavailable(NetError),
    /// Bring-up was cancelled from outside.
    Cancelled,
    /// The time server gave no usable timestamp.
    TimeSync,
    /// The broker socket could not be opened.
    SocketOpen(NetError),
    /// The broker socket could not be connected.
    SocketConnect(NetError),
    /// The MQTT handshake failed.
    MqttConnect(NetError),
    /// The topic subscription failed.
    Subscribe(NetError),
    /// The configuration was rejected.
    Config(ConfigError),
}

impl Error {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TimeSync => 1,
            _ => -1,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NoInterface => f.write_str("unable to open network interface"),
            Error::NetworkUnavailable(e) => write!(f, "unable to connect to network: {}", e),
            Error::Cancelled => f.write_str("network bring-up cancelled"),
            Error::TimeSync => f.write_str("failed to retrieve the time"),
            Error::SocketOpen(e) => write!(f, "could not open socket: {}", e),
            Error::SocketConnect(e) => write!(f, "could not connect: {}", e),
            Error::MqttConnect(e) => write!(f, "MQTT connect failed: {}", e),
            Error::Subscribe(e) => write!(f, "MQTT subscribe failed: {}", e),
            Error::Config(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NoInterface => defmt::write!(f, "NoInterface"),
            Error::NetworkUnavailable(e) => defmt::write!(f, "NetworkUnavailable({})", e),
            Error::Cancelled => defmt::write!(f, "Cancelled"),
            Error::TimeSync => defmt::write!(f, "TimeSync"),
            Error::SocketOpen(e) => defmt::write!(f, "SocketOpen({})", e),
            Error::SocketConnect(e) => defmt::write!(f, "SocketConnect({})", e),
            Error::MqttConnect(e) => defmt::write!(f, "MqttConnect({})", e),
            Error::Subscribe(e) => defmt::write!(f, "Subscribe({})", e),
            Error::Config(e) => defmt::write!(f, "Config({})", e),
        }
    }
}
