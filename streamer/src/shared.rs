use crate::gate::ReadGate;
use crate::metrics::{Metrics, MetricsSnapshot};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

/// State shared between the device, its handles and the producer thread.
#[derive(Debug)]
pub(crate) struct StreamShared {
  pub(crate) gate: ReadGate,
  pub(crate) metrics: Metrics,
  pub(crate) open_instances: AtomicUsize,
  // Cleared on shutdown; handles opened before that fail with `Unavailable`.
  online: AtomicBool,
  faulted: AtomicBool,
  fault: Mutex<Option<String>>,
}

impl StreamShared {
  pub(crate) fn new(gate: ReadGate) -> Self {
    Self {
      gate,
      metrics: Metrics::new(),
      open_instances: AtomicUsize::new(0),
      online: AtomicBool::new(true),
      faulted: AtomicBool::new(false),
      fault: Mutex::new(None),
    }
  }

  #[inline]
  pub(crate) fn is_online(&self) -> bool {
    self.online.load(Ordering::Acquire)
  }

  pub(crate) fn go_offline(&self) {
    self.online.store(false, Ordering::Release);
  }

  /// Records a fatal producer failure. Only the first one is kept.
  pub(crate) fn mark_faulted(&self, reason: String) {
    let mut fault = self.fault.lock();
    if fault.is_none() {
      *fault = Some(reason);
    }
    self.faulted.store(true, Ordering::Release);
  }

  /// The reason the producer died, if it did.
  pub(crate) fn fault(&self) -> Option<String> {
    if !self.faulted.load(Ordering::Acquire) {
      return None;
    }
    self.fault.lock().clone()
  }

  pub(crate) fn metrics_snapshot(&self) -> MetricsSnapshot {
    self.metrics.snapshot(self.gate.signal().fired_total())
  }
}
