//! Configuration for a gateway session.
//!
//! Use defaults, load a TOML document, or override via environment
//! variables:
//!
//! - `GATEWAY_HOST`                 (default: "127.0.0.1")
//! - `GATEWAY_PORT`                 (default: "7497")
//! - `GATEWAY_CLIENT_ID`            (default: "1")
//! - `GATEWAY_MIN_VERSION`          (default: lowest supported)
//! - `GATEWAY_MAX_VERSION`          (default: highest supported)
//! - `GATEWAY_CONNECT_TIMEOUT_MS`   (default: "5000")
//! - `GATEWAY_HANDSHAKE_TIMEOUT_MS` (default: "10000")
//! - `GATEWAY_MAX_DECODE_FAILURES`  (default: "8")
//! - `GATEWAY_MAX_FRAME_LEN`        (default: 16 MiB)

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use trade_protocol::wire_types::{DEFAULT_MAX_FRAME_LEN, MAX_CLIENT_VERSION, MIN_CLIENT_VERSION};

/// Errors while building a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {key}={value:?} is invalid: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Gateway host name or IP address.
    pub host: String,

    /// Gateway TCP port.
    pub port: u16,

    /// Client identifier requested in the handshake.
    pub client_id: i64,

    /// Lowest protocol version offered.
    pub min_version: u32,

    /// Highest protocol version offered.
    pub max_version: u32,

    pub connect_timeout_ms: u64,

    pub handshake_timeout_ms: u64,

    /// Consecutive undecodable frames tolerated before the session is
    /// declared failed. `0` disables the limit.
    pub max_consecutive_decode_failures: u32,

    /// Largest frame payload accepted from the gateway.
    pub max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 1,
            min_version: MIN_CLIENT_VERSION,
            max_version: MAX_CLIENT_VERSION,
            connect_timeout_ms: 5_000,
            handshake_timeout_ms: 10_000,
            max_consecutive_decode_failures: 8,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl SessionConfig {
    /// Construct a `SessionConfig` from environment variables, falling
    /// back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = SessionConfig::default();

        let config = SessionConfig {
            host: env::var("GATEWAY_HOST").unwrap_or(defaults.host),
            port: read_env_or_default("GATEWAY_PORT", defaults.port)?,
            client_id: read_env_or_default("GATEWAY_CLIENT_ID", defaults.client_id)?,
            min_version: read_env_or_default("GATEWAY_MIN_VERSION", defaults.min_version)?,
            max_version: read_env_or_default("GATEWAY_MAX_VERSION", defaults.max_version)?,
            connect_timeout_ms: read_env_or_default(
                "GATEWAY_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout_ms,
            )?,
            handshake_timeout_ms: read_env_or_default(
                "GATEWAY_HANDSHAKE_TIMEOUT_MS",
                defaults.handshake_timeout_ms,
            )?,
            max_consecutive_decode_failures: read_env_or_default(
                "GATEWAY_MAX_DECODE_FAILURES",
                defaults.max_consecutive_decode_failures,
            )?,
            max_frame_len: read_env_or_default("GATEWAY_MAX_FRAME_LEN", defaults.max_frame_len)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings no session could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_version > self.max_version {
            return Err(ConfigError::Invalid(format!(
                "min_version {} is above max_version {}",
                self.min_version, self.max_version
            )));
        }
        if self.max_frame_len == 0 {
            return Err(ConfigError::Invalid("max_frame_len must be positive".to_string()));
        }
        Ok(())
    }

    /// Convenience: `host:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

fn read_env_or_default<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| ConfigError::Env {
            key,
            reason: e.to_string(),
            value: val,
        }),
        Err(_) => Ok(default),
    }
}
