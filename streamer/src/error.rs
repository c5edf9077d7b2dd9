use std::io;

use thiserror::Error;

/// Errors surfaced at the channel boundary (open, read, write, shutdown).
#[derive(Debug, Error)]
pub enum DeviceError {
  /// The channel could not be opened, or a handle was used after the device went offline.
  #[error("stream device is unavailable")]
  Unavailable,

  /// The channel is read-only; every write is rejected with this error.
  #[error("invalid operation: the stream device is read-only")]
  InvalidOperation,

  /// Transferring bytes into the caller's sink failed. The read cursor did not advance.
  #[error("failed to copy batch bytes to the reader: {0}")]
  CopyFault(#[source] io::Error),

  /// The producer loop died because its batch source failed.
  #[error("producer loop faulted: {0}")]
  ProducerFault(String),

  /// The producer thread could not be spawned.
  #[error("failed to spawn producer thread: {0}")]
  Spawn(#[source] io::Error),
}

/// Errors that can occur when building a `Streamer`.
#[derive(Debug, Error)]
pub enum BuildError {
  /// A batch must hold at least one byte.
  #[error("stream capacity cannot be zero")]
  ZeroCapacity,

  /// The producer needs a non-zero wait to observe shutdown requests.
  #[error("refill timeout cannot be zero")]
  ZeroRefillTimeout,

  /// The producer thread name is empty or contains a NUL byte.
  #[error("invalid producer thread name: {0:?}")]
  InvalidThreadName(String),

  /// The first batch could not be generated.
  #[error("failed to generate the initial batch: {0}")]
  InitialBatch(#[from] SourceError),

  #[error(transparent)]
  Device(#[from] DeviceError),
}

/// Returned by a `BatchSource` that could not generate a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch source failed: {message}")]
pub struct SourceError {
  pub message: String,
}

impl SourceError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Errors produced while loading a `StreamerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read configuration file: {0}")]
  Read(#[from] io::Error),

  #[error("failed to parse configuration: {0}")]
  Parse(String),

  #[error("invalid configuration value for '{field}': {message}")]
  Invalid { field: String, message: String },
}

/// A specialized `Result` type for channel operations.
pub type Result<T, E = DeviceError> = std::result::Result<T, E>;
