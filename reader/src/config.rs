use fibre_streamer::config::deserialize_duration;
use fibre_streamer::{ConfigError, StreamerConfig};

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_READ_SIZE: usize = 1;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(20);

/// Settings for the polling consumer, plus the device it drives.
///
/// ```yaml
/// read_size: 4
/// poll_interval: 1ms
/// streamer:
///   capacity: 64
///   refill_timeout: 500ms
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
  /// Bytes requested per read call.
  pub read_size: usize,
  /// Delay between two read calls.
  #[serde(deserialize_with = "deserialize_duration")]
  pub poll_interval: Duration,
  /// Stop after this many bytes. Runs until interrupted when absent.
  pub max_bytes: Option<u64>,
  pub streamer: StreamerConfig,
}

impl Default for ReaderConfig {
  fn default() -> Self {
    Self {
      read_size: DEFAULT_READ_SIZE,
      poll_interval: DEFAULT_POLL_INTERVAL,
      max_bytes: None,
      streamer: StreamerConfig::default(),
    }
  }
}

impl ReaderConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    let config: Self =
      serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.read_size == 0 {
      return Err(ConfigError::Invalid {
        field: "read_size".to_string(),
        message: "must be greater than 0".to_string(),
      });
    }
    self.streamer.validate()
  }
}
