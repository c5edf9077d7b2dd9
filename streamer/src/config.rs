//! File-driven configuration for a `Streamer`.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! capacity: 64
//! refill_timeout: 500ms
//! producer_thread_name: fibre-streamer-producer
//! ```

use crate::error::ConfigError;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

pub const DEFAULT_CAPACITY: usize = 64;
pub const DEFAULT_REFILL_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_PRODUCER_THREAD_NAME: &str = "fibre-streamer-producer";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamerConfig {
  /// Size of one batch in bytes.
  pub capacity: usize,
  /// How long the producer waits for a refill request before re-checking for shutdown.
  #[serde(deserialize_with = "deserialize_duration")]
  pub refill_timeout: Duration,
  pub producer_thread_name: String,
}

impl Default for StreamerConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      refill_timeout: DEFAULT_REFILL_TIMEOUT,
      producer_thread_name: DEFAULT_PRODUCER_THREAD_NAME.to_string(),
    }
  }
}

impl StreamerConfig {
  /// Parses and validates a YAML document.
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    // serde_yaml rejects an empty document, but "no overrides" is a valid config here.
    if yaml.trim().is_empty() {
      return Ok(Self::default());
    }
    let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a YAML file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.capacity == 0 {
      return Err(ConfigError::Invalid {
        field: "capacity".to_string(),
        message: "must be greater than 0".to_string(),
      });
    }
    if self.refill_timeout.is_zero() {
      return Err(ConfigError::Invalid {
        field: "refill_timeout".to_string(),
        message: "must be a non-zero duration".to_string(),
      });
    }
    if self.producer_thread_name.is_empty() {
      return Err(ConfigError::Invalid {
        field: "producer_thread_name".to_string(),
        message: "cannot be empty".to_string(),
      });
    }
    if self.producer_thread_name.contains('\0') {
      return Err(ConfigError::Invalid {
        field: "producer_thread_name".to_string(),
        message: "cannot contain NUL bytes".to_string(),
      });
    }
    Ok(())
  }
}

/// Accepts human-readable durations such as `"500ms"` or `"2s"`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
