use crate::config::{
  StreamerConfig, DEFAULT_CAPACITY, DEFAULT_PRODUCER_THREAD_NAME, DEFAULT_REFILL_TIMEOUT,
};
use crate::device::Streamer;
use crate::error::BuildError;
use crate::gate::ReadGate;
use crate::producer::Producer;
use crate::shared::StreamShared;
use crate::source::BatchSource;

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A builder for creating `Streamer` devices.
pub struct StreamerBuilder {
  capacity: usize,
  refill_timeout: Duration,
  producer_thread_name: String,
  source: Option<Box<dyn BatchSource>>,
}

// Manual Debug implementation: the source is an opaque trait object.
impl fmt::Debug for StreamerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamerBuilder")
      .field("capacity", &self.capacity)
      .field("refill_timeout", &self.refill_timeout)
      .field("producer_thread_name", &self.producer_thread_name)
      .field("has_source", &self.source.is_some())
      .finish()
  }
}

impl Default for StreamerBuilder {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      refill_timeout: DEFAULT_REFILL_TIMEOUT,
      producer_thread_name: DEFAULT_PRODUCER_THREAD_NAME.to_string(),
      source: None,
    }
  }
}

impl StreamerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts from a loaded configuration. The source still defaults to random bytes.
  pub fn from_config(config: &StreamerConfig) -> Self {
    Self::new()
      .capacity(config.capacity)
      .refill_timeout(config.refill_timeout)
      .producer_thread_name(config.producer_thread_name.clone())
  }

  /// Sets the batch size in bytes.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets how long the producer waits for a refill request before re-checking for shutdown.
  /// This bounds the shutdown latency.
  pub fn refill_timeout(mut self, timeout: Duration) -> Self {
    self.refill_timeout = timeout;
    self
  }

  pub fn producer_thread_name(mut self, name: impl Into<String>) -> Self {
    self.producer_thread_name = name.into();
    self
  }

  /// Sets the generator for batch contents.
  pub fn source<S: BatchSource>(mut self, source: S) -> Self {
    self.source = Some(Box::new(source));
    self
  }

  /// Generates the first batch, then spawns the producer.
  ///
  /// # Errors
  ///
  /// - `BuildError::ZeroCapacity` / `BuildError::ZeroRefillTimeout` /
  ///   `BuildError::InvalidThreadName` for invalid settings.
  /// - `BuildError::InitialBatch` if the source fails on the first batch.
  /// - `BuildError::Device` if the producer thread cannot be spawned.
  pub fn build(self) -> Result<Streamer, BuildError> {
    if self.capacity == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if self.refill_timeout.is_zero() {
      return Err(BuildError::ZeroRefillTimeout);
    }
    // `thread::Builder::name` panics on interior NUL bytes.
    if self.producer_thread_name.is_empty() || self.producer_thread_name.contains('\0') {
      return Err(BuildError::InvalidThreadName(self.producer_thread_name));
    }

    let mut source = match self.source {
      Some(source) => source,
      None => default_source(),
    };

    let mut initial = vec![0u8; self.capacity].into_boxed_slice();
    source.fill(&mut initial)?;

    let shared = Arc::new(StreamShared::new(ReadGate::new(initial)));
    let producer = Producer::spawn(
      shared.clone(),
      source,
      self.refill_timeout,
      &self.producer_thread_name,
    )?;

    tracing::info!(
      capacity = self.capacity,
      refill_timeout = ?self.refill_timeout,
      "stream device initialized"
    );
    Ok(Streamer::from_parts(shared, producer))
  }
}

#[cfg(feature = "random")]
fn default_source() -> Box<dyn BatchSource> {
  Box::new(crate::source::RandomSource::new())
}

#[cfg(not(feature = "random"))]
fn default_source() -> Box<dyn BatchSource> {
  Box::new(crate::source::SequenceSource::new())
}
