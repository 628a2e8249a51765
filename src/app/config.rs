//! Runtime configuration.
//!
//! Every value has a compiled-in default. A JSON document (for example a
//! file on the host, or a blob in flash) can override any subset of fields:
//!
//! ```json
//! { "broker_host": "broker.local", "device_id": "bench-01",
//!   "retry": { "max_attempts": 10 } }
//! ```

use serde::Deserialize;

/// Default broker host name.
pub const MQTT_SERVER_HOST_NAME: &str = "test.mosquitto.org";
/// Default broker port (plain TCP).
pub const MQTT_SERVER_PORT: u16 = 1883;
/// Default client id, also embedded in published payloads.
pub const MQTT_DEVICE_ID: &str = "JustForDemo";
/// Default topic button presses are published to.
pub const MQTT_PUB_TOPIC: &str = "aaeon_lyd/gutc/to_broker";
/// Default topic subscribed to.
pub const MQTT_SUB_TOPIC: &str = "aaeon_lyd/gutc/from_broker";
/// Default time server.
pub const NTP_SERVER: &str = "time.google.com";
/// Default time server port.
pub const NTP_SERVER_PORT: u16 = 123;
/// Longest accepted device id. Keeps every numbered payload within the
/// publish buffer.
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// How attempts to bring the network up are repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Give up after this many attempts. `None` retries until cancelled.
    pub max_attempts: Option<u32>,
    /// Wait after the first failure.
    pub initial_backoff_ms: u32,
    /// Upper bound for the doubling wait.
    pub max_backoff_ms: u32,
}

impl RetryPolicy {
    /// Retry until cancelled, backing off from 500 ms up to 30 s.
    pub const UNTIL_CANCELLED: Self = Self {
        max_attempts: None,
        initial_backoff_ms: 500,
        max_backoff_ms: 30_000,
    };

    /// Wait before the attempt following failed attempt number `attempt`
    /// (1-based): `initial * 2^(attempt - 1)`, capped.
    pub fn backoff_ms(&self, attempt: u32) -> u32 {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial_backoff_ms
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff_ms)
    }

    /// Whether no attempt may follow failed attempt number `attempt`.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::UNTIL_CANCELLED
    }
}

/// Firmware configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config<'a> {
    /// Broker host name or address.
    pub broker_host: &'a str,
    /// Broker TCP port.
    pub broker_port: u16,
    /// Broker user name; empty for none.
    pub username: &'a str,
    /// Broker password; empty for none.
    pub password: &'a str,
    /// MQTT client id and payload device id.
    pub device_id: &'a str,
    /// Topic button presses publish to.
    pub pub_topic: &'a str,
    /// Topic subscribed to.
    pub sub_topic: &'a str,
    /// Time server host name.
    pub ntp_server: &'a str,
    /// Time server port.
    pub ntp_port: u16,
    /// MQTT keepalive interval.
    pub keep_alive_seconds: u16,
    /// How long each loop iteration services the session.
    pub yield_timeout_ms: u32,
    /// Sleep at the end of each loop iteration; also the heartbeat period.
    pub blink_interval_ms: u32,
    /// Network bring-up retry.
    pub retry: RetryPolicy,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            broker_host: MQTT_SERVER_HOST_NAME,
            broker_port: MQTT_SERVER_PORT,
            username: "",
            password: "",
            device_id: MQTT_DEVICE_ID,
            pub_topic: MQTT_PUB_TOPIC,
            sub_topic: MQTT_SUB_TOPIC,
            ntp_server: NTP_SERVER,
            ntp_port: NTP_SERVER_PORT,
            keep_alive_seconds: 60,
            yield_timeout_ms: 100,
            blink_interval_ms: 500,
            retry: RetryPolicy::default(),
        }
    }
}

/// A configuration document could not be used.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    /// Not valid JSON, or a field has the wrong type.
    Parse,
    /// Parsed, but the values cannot work together.
    Invalid(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Parse => f.write_str("malformed configuration document"),
            ConfigError::Invalid(why) => write!(f, "invalid configuration: {}", why),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::Parse => defmt::write!(f, "Parse"),
            ConfigError::Invalid(why) => defmt::write!(f, "Invalid({=str})", why),
        }
    }
}

impl<'a> Config<'a> {
    /// Parses a JSON document; omitted fields keep their defaults.
    ///
    /// String values are borrowed from `json` and must not contain escape
    /// sequences.
    pub fn from_json(json: &'a str) -> Result<Self, ConfigError> {
        let (config, _) =
            serde_json_core::from_str::<Config<'a>>(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the firmware cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker_host.is_empty() {
            return Err(ConfigError::Invalid("broker_host is empty"));
        }
        if self.device_id.is_empty() {
            return Err(ConfigError::Invalid("device_id is empty"));
        }
        if self.device_id.len() > MAX_DEVICE_ID_LEN {
            return Err(ConfigError::Invalid("device_id is too long"));
        }
        if self.pub_topic.is_empty() || self.sub_topic.is_empty() {
            return Err(ConfigError::Invalid("topics must not be empty"));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}
