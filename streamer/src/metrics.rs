use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

/// Lock-free counters for one streamer. The read path and the producer update
/// different fields, so they are padded apart.
#[derive(Debug)]
pub struct Metrics {
  // --- Consumer side ---
  pub(crate) reads: CachePadded<AtomicU64>,
  pub(crate) empty_reads: CachePadded<AtomicU64>,
  pub(crate) bytes_delivered: CachePadded<AtomicU64>,
  pub(crate) copy_faults: CachePadded<AtomicU64>,
  pub(crate) rejected_writes: CachePadded<AtomicU64>,

  // --- Producer side ---
  pub(crate) batches_produced: CachePadded<AtomicU64>,
  pub(crate) refill_timeouts: CachePadded<AtomicU64>,

  // --- Handles ---
  pub(crate) opens: CachePadded<AtomicU64>,
  pub(crate) closes: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      reads: CachePadded::new(AtomicU64::new(0)),
      empty_reads: CachePadded::new(AtomicU64::new(0)),
      bytes_delivered: CachePadded::new(AtomicU64::new(0)),
      copy_faults: CachePadded::new(AtomicU64::new(0)),
      rejected_writes: CachePadded::new(AtomicU64::new(0)),
      batches_produced: CachePadded::new(AtomicU64::new(0)),
      refill_timeouts: CachePadded::new(AtomicU64::new(0)),
      opens: CachePadded::new(AtomicU64::new(0)),
      closes: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn record_read(&self, delivered: usize) {
    self.reads.fetch_add(1, Ordering::Relaxed);
    if delivered == 0 {
      self.empty_reads.fetch_add(1, Ordering::Relaxed);
    } else {
      self
        .bytes_delivered
        .fetch_add(delivered as u64, Ordering::Relaxed);
    }
  }

  /// `refills_requested` lives on the refill signal; it is passed in to keep a single
  /// source of truth.
  pub(crate) fn snapshot(&self, refills_requested: u64) -> MetricsSnapshot {
    MetricsSnapshot {
      reads: self.reads.load(Ordering::Relaxed),
      empty_reads: self.empty_reads.load(Ordering::Relaxed),
      bytes_delivered: self.bytes_delivered.load(Ordering::Relaxed),
      copy_faults: self.copy_faults.load(Ordering::Relaxed),
      rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
      refills_requested,
      batches_produced: self.batches_produced.load(Ordering::Relaxed),
      refill_timeouts: self.refill_timeouts.load(Ordering::Relaxed),
      opens: self.opens.load(Ordering::Relaxed),
      closes: self.closes.load(Ordering::Relaxed),
      uptime: self.created_at.elapsed(),
    }
  }
}

/// A point-in-time copy of a streamer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
  /// Read calls that reached the gate, empty ones included.
  pub reads: u64,
  /// Reads that returned 0 bytes.
  pub empty_reads: u64,
  pub bytes_delivered: u64,
  pub copy_faults: u64,
  pub rejected_writes: u64,
  /// Times a read drained a batch and fired the refill signal.
  pub refills_requested: u64,
  /// Batches published by the producer loop, not counting the initial batch.
  pub batches_produced: u64,
  /// Producer waits that ended without a refill request.
  pub refill_timeouts: u64,
  pub opens: u64,
  pub closes: u64,
  pub uptime: Duration,
}

impl fmt::Display for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "reads={} (empty={}) bytes={} refills={}/{} copy_faults={} rejected_writes={} opens={} closes={} uptime={:?}",
      self.reads,
      self.empty_reads,
      self.bytes_delivered,
      self.batches_produced,
      self.refills_requested,
      self.copy_faults,
      self.rejected_writes,
      self.opens,
      self.closes,
      self.uptime,
    )
  }
}
