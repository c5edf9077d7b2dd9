use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A binary, resettable "batch drained" event.
///
/// The reader fires it when the cursor reaches the end of a batch; the producer consumes it
/// with a bounded wait so it can also observe shutdown requests between waits.
#[derive(Debug, Default)]
pub struct RefillSignal {
  drained: Mutex<bool>,
  cond: Condvar,
  fired_total: AtomicU64,
}

impl RefillSignal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Marks the batch as drained and wakes the waiting producer.
  pub fn fire(&self) {
    let mut drained = self.drained.lock();
    *drained = true;
    self.fired_total.fetch_add(1, Ordering::Relaxed);
    self.cond.notify_one();
  }

  /// Waits up to `timeout` for the signal.
  ///
  /// Returns `true` if the signal was fired, clearing it in the same step. Returns `false`
  /// on timeout, which is not an error.
  pub fn wait_timeout(&self, timeout: Duration) -> bool {
    let mut drained = self.drained.lock();
    if !*drained {
      // Spurious wakeups are absorbed by re-checking the flag below.
      let _ = self.cond.wait_while_for(&mut drained, |drained| !*drained, timeout);
    }
    let fired = *drained;
    *drained = false;
    fired
  }

  /// Returns `true` if the signal is set and nobody consumed it yet.
  pub fn is_fired(&self) -> bool {
    *self.drained.lock()
  }

  /// Total number of times the signal was fired since creation.
  pub fn fired_total(&self) -> u64 {
    self.fired_total.load(Ordering::Relaxed)
  }
}
