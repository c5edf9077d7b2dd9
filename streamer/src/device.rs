//! The channel boundary: a `Streamer` device and the `StreamHandle`s opened on it.

use crate::builder::StreamerBuilder;
use crate::error::{DeviceError, Result};
use crate::metrics::MetricsSnapshot;
use crate::producer::Producer;
use crate::shared::StreamShared;

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A read-only streaming device.
///
/// Owns the batch buffer and the producer thread that refills it. Dropping the device
/// stops the producer; prefer [`Streamer::shutdown`] to observe a producer fault.
pub struct Streamer {
  shared: Arc<StreamShared>,
  producer: Option<Producer>,
}

impl fmt::Debug for Streamer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Streamer")
      .field("capacity", &self.shared.gate.capacity())
      .field("open_instances", &self.open_instances())
      .field("online", &self.shared.is_online())
      .finish_non_exhaustive()
  }
}

impl Streamer {
  /// Starts configuring a new device.
  pub fn builder() -> StreamerBuilder {
    StreamerBuilder::new()
  }

  pub(crate) fn from_parts(shared: Arc<StreamShared>, producer: Producer) -> Self {
    Self {
      shared,
      producer: Some(producer),
    }
  }

  /// Opens a handle on the device.
  ///
  /// # Errors
  ///
  /// `DeviceError::Unavailable` once the device is shutting down or its producer has died.
  pub fn open(&self) -> Result<StreamHandle> {
    let producer_alive = self
      .producer
      .as_ref()
      .is_some_and(|producer| !producer.is_finished());
    if !self.shared.is_online() || !producer_alive || self.shared.fault().is_some() {
      tracing::warn!("open rejected: stream device is unavailable");
      return Err(DeviceError::Unavailable);
    }

    let instances = self.shared.open_instances.fetch_add(1, Ordering::AcqRel) + 1;
    self.shared.metrics.opens.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(open_instances = instances, "stream handle opened");

    Ok(StreamHandle {
      shared: self.shared.clone(),
      closed: false,
    })
  }

  /// Number of handles currently open. Informational only.
  pub fn open_instances(&self) -> usize {
    self.shared.open_instances.load(Ordering::Acquire)
  }

  /// Size of one batch in bytes.
  pub fn capacity(&self) -> usize {
    self.shared.gate.capacity()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics_snapshot()
  }

  /// The reason the producer loop died, if it did.
  pub fn fault(&self) -> Option<String> {
    self.shared.fault()
  }

  /// Takes the device offline, stops the producer and waits for it to exit.
  ///
  /// Shutdown latency is bounded by the configured refill timeout.
  ///
  /// # Errors
  ///
  /// `DeviceError::ProducerFault` if the producer loop died before the shutdown.
  pub fn shutdown(mut self) -> Result<()> {
    self.shutdown_internal()
  }

  fn shutdown_internal(&mut self) -> Result<()> {
    let Some(producer) = self.producer.take() else {
      return Ok(());
    };
    tracing::info!(capacity = self.capacity(), "stream device shutting down");
    self.shared.go_offline();
    let result = producer.join();
    tracing::info!(metrics = %self.metrics(), "stream device stopped");
    result
  }
}

impl Drop for Streamer {
  fn drop(&mut self) {
    if let Err(err) = self.shutdown_internal() {
      tracing::error!(error = %err, "stream device stopped with a producer fault");
    }
  }
}

/// An open handle on a `Streamer`. Closing it happens on drop.
pub struct StreamHandle {
  shared: Arc<StreamShared>,
  closed: bool,
}

impl fmt::Debug for StreamHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StreamHandle")
      .field("gate", &self.shared.gate)
      .field("closed", &self.closed)
      .finish()
  }
}

impl StreamHandle {
  fn ensure_readable(&self) -> Result<()> {
    if let Some(reason) = self.shared.fault() {
      return Err(DeviceError::ProducerFault(reason));
    }
    if !self.shared.is_online() {
      return Err(DeviceError::Unavailable);
    }
    Ok(())
  }

  /// Reads up to `buf.len()` bytes of the current batch.
  ///
  /// Never blocks. A short count is normal, and 0 means "nothing ready yet, try again".
  pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
    self.ensure_readable()?;
    let delivered = self.shared.gate.read(buf);
    self.shared.metrics.record_read(delivered);
    tracing::trace!(requested = buf.len(), delivered, "read");
    Ok(delivered)
  }

  /// Reads up to `requested` bytes straight into `sink`.
  ///
  /// # Errors
  ///
  /// `DeviceError::CopyFault` if the sink fails. Nothing is consumed in that case.
  pub fn read_into<W>(&mut self, requested: usize, sink: &mut W) -> Result<usize>
  where
    W: Write + ?Sized,
  {
    self.ensure_readable()?;
    match self.shared.gate.read_into(requested, sink) {
      Ok(delivered) => {
        self.shared.metrics.record_read(delivered);
        tracing::trace!(requested, delivered, "read");
        Ok(delivered)
      }
      Err(err) => {
        self.shared.metrics.copy_faults.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(error = %err, "copy to reader failed, cursor left unchanged");
        Err(DeviceError::CopyFault(err))
      }
    }
  }

  /// The device is read-only: always fails with `DeviceError::InvalidOperation`.
  pub fn write(&mut self, _buf: &[u8]) -> Result<usize> {
    self
      .shared
      .metrics
      .rejected_writes
      .fetch_add(1, Ordering::Relaxed);
    Err(DeviceError::InvalidOperation)
  }

  /// Size of one batch in bytes.
  pub fn capacity(&self) -> usize {
    self.shared.gate.capacity()
  }

  /// Releases the handle.
  pub fn close(mut self) {
    self.close_internal();
  }

  fn close_internal(&mut self) {
    if self.closed {
      return;
    }
    self.closed = true;
    let remaining = self.shared.open_instances.fetch_sub(1, Ordering::AcqRel) - 1;
    self.shared.metrics.closes.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(open_instances = remaining, "stream handle closed");
  }
}

impl Drop for StreamHandle {
  fn drop(&mut self) {
    self.close_internal();
  }
}

impl From<DeviceError> for io::Error {
  fn from(err: DeviceError) -> Self {
    let kind = match &err {
      DeviceError::Unavailable => io::ErrorKind::NotConnected,
      DeviceError::InvalidOperation => io::ErrorKind::Unsupported,
      DeviceError::CopyFault(inner) => inner.kind(),
      DeviceError::ProducerFault(_) | DeviceError::Spawn(_) => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
  }
}

/// `io::Read` treats `Ok(0)` as end of stream, which this device never reaches. An empty
/// read on a non-empty buffer is reported as `ErrorKind::WouldBlock` instead.
impl io::Read for StreamHandle {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    match StreamHandle::read(self, buf)? {
      0 if !buf.is_empty() => Err(io::ErrorKind::WouldBlock.into()),
      n => Ok(n),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::SequenceSource;
  use std::time::Duration;

  fn streamer(capacity: usize) -> Streamer {
    Streamer::builder()
      .capacity(capacity)
      .refill_timeout(Duration::from_millis(20))
      .source(SequenceSource::new())
      .build()
      .unwrap()
  }

  #[test]
  fn open_and_close_track_instances() {
    let device = streamer(4);
    let first = device.open().unwrap();
    let second = device.open().unwrap();
    assert_eq!(device.open_instances(), 2);
    first.close();
    assert_eq!(device.open_instances(), 1);
    drop(second);
    assert_eq!(device.open_instances(), 0);

    let metrics = device.metrics();
    assert_eq!((metrics.opens, metrics.closes), (2, 2));
  }

  #[test]
  fn write_is_rejected_and_leaves_the_batch_alone() {
    let device = streamer(4);
    let mut handle = device.open().unwrap();
    assert!(matches!(
      handle.write(&[0xFF; 4]),
      Err(DeviceError::InvalidOperation)
    ));

    let mut out = [0u8; 4];
    assert_eq!(handle.read(&mut out).unwrap(), 4);
    assert_eq!(out, [0, 1, 2, 3]);
    assert_eq!(device.metrics().rejected_writes, 1);
  }

  #[test]
  fn handles_outliving_the_device_are_unavailable() {
    let device = streamer(4);
    let mut handle = device.open().unwrap();
    device.shutdown().unwrap();

    let mut out = [0u8; 2];
    assert!(matches!(handle.read(&mut out), Err(DeviceError::Unavailable)));
  }

  #[test]
  fn io_read_reports_would_block_instead_of_eof() {
    use std::io::Read;

    let device = streamer(2);
    let mut handle = device.open().unwrap();
    let mut out = [0u8; 2];
    assert_eq!(Read::read(&mut handle, &mut out).unwrap(), 2);

    // Right after a drain the gate is empty until the producer publishes.
    match Read::read(&mut handle, &mut out) {
      Ok(n) => assert_eq!(n, 2),
      Err(err) => assert_eq!(err.kind(), io::ErrorKind::WouldBlock),
    }
  }
}
