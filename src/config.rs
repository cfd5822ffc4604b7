//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Default outbound queue capacity per connection.
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 256;
/// Default idle read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;
/// Default write deadline in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;
/// Default keepalive interval in seconds (9/10 of the read timeout).
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 54;
/// Default maximum inbound frame size in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 8192;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Per-connection timing and buffering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Fixed capacity of each connection's outbound queue.
    pub send_queue_capacity: usize,
    /// Idle time after which the inbound task gives up on the client.
    pub read_timeout: Duration,
    /// Deadline for a single frame write.
    pub write_timeout: Duration,
    /// Interval between protocol keepalive probes.
    pub ping_interval: Duration,
    /// Maximum accepted inbound frame size in bytes.
    pub max_message_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ConnectionConfig {
    /// Checks the invariants between the individual settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the queue capacity is zero or the
    /// keepalive interval is not strictly shorter than the read timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "HUB_SEND_QUEUE_CAPACITY must be at least 1".to_string(),
            ));
        }
        if self.ping_interval.is_zero() || self.ping_interval >= self.read_timeout {
            return Err(ConfigError::Invalid(format!(
                "HUB_PING_INTERVAL_SECS ({}s) must be non-zero and below HUB_READ_TIMEOUT_SECS ({}s)",
                self.ping_interval.as_secs(),
                self.read_timeout.as_secs()
            )));
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "HUB_WRITE_TIMEOUT_SECS must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` could not be parsed.
    #[error("invalid LISTEN_ADDR: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),

    /// Settings are individually valid but inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Per-connection parameters.
    pub connection: ConnectionConfig,

    /// Log output format.
    pub log_format: LogFormat,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults above when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR` is set but cannot be
    /// parsed, or if the resulting [`ConnectionConfig`] is inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let connection = ConnectionConfig {
            send_queue_capacity: parse_env("HUB_SEND_QUEUE_CAPACITY", DEFAULT_SEND_QUEUE_CAPACITY),
            read_timeout: Duration::from_secs(parse_env(
                "HUB_READ_TIMEOUT_SECS",
                DEFAULT_READ_TIMEOUT_SECS,
            )),
            write_timeout: Duration::from_secs(parse_env(
                "HUB_WRITE_TIMEOUT_SECS",
                DEFAULT_WRITE_TIMEOUT_SECS,
            )),
            ping_interval: Duration::from_secs(parse_env(
                "HUB_PING_INTERVAL_SECS",
                DEFAULT_PING_INTERVAL_SECS,
            )),
            max_message_size: parse_env("HUB_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE),
        };
        connection.validate()?;

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            connection,
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
