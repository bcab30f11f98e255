use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::net::Encoding;
use crate::{Error, Result};

/// Configuration settings for a connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Encoding used for frames and payloads
    pub encoding: Encoding,
    /// Timeout applied to calls issued with a zero timeout, `None` waits
    /// for the response indefinitely
    pub default_timeout_ms: Option<u64>,
    /// Largest accepted frame, in bytes
    pub max_frame_len: usize,
    /// Capacity of the outgoing request queue
    pub queue_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::MsgPack,
            default_timeout_ms: None,
            max_frame_len: 16 * 1024 * 1024,
            queue_capacity: 64,
        }
    }
}

impl ConnectionConfig {
    /// Reads the configuration from a toml file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    /// Resolves the effective timeout for a call.
    ///
    /// A zero timeout defers to the configured default.
    pub fn effective_timeout(&self, timeout: Duration) -> Option<Duration> {
        if timeout.is_zero() {
            self.default_timeout_ms.map(Duration::from_millis)
        } else {
            Some(timeout)
        }
    }
}

impl FromStr for ConnectionConfig {
    type Err = Error;
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        if config.queue_capacity == 0 {
            return Err(Error::ParsingError(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
