use crate::error::{DeviceError, SourceError};
use crate::shared::StreamShared;
use crate::source::BatchSource;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The background task that refills the batch each time a reader drains it.
pub(crate) struct Producer {
  handle: JoinHandle<Result<(), SourceError>>,
  stop_flag: Arc<AtomicBool>,
}

impl Producer {
  /// Spawns the producer thread.
  pub(crate) fn spawn(
    shared: Arc<StreamShared>,
    source: Box<dyn BatchSource>,
    refill_timeout: Duration,
    thread_name: &str,
  ) -> Result<Self, DeviceError> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_clone = stop_flag.clone();

    let handle = thread::Builder::new()
      .name(thread_name.to_string())
      .spawn(move || Self::run(&shared, source, refill_timeout, &stop_clone))
      .map_err(DeviceError::Spawn)?;

    Ok(Self { handle, stop_flag })
  }

  /// The producer loop. Returns only on a stop request or a source failure.
  fn run(
    shared: &StreamShared,
    mut source: Box<dyn BatchSource>,
    refill_timeout: Duration,
    stop_flag: &AtomicBool,
  ) -> Result<(), SourceError> {
    let gate = &shared.gate;
    let mut scratch = vec![0u8; gate.capacity()].into_boxed_slice();

    tracing::debug!(
      capacity = gate.capacity(),
      ?refill_timeout,
      "producer loop started"
    );

    while !stop_flag.load(Ordering::Relaxed) {
      if !gate.signal().wait_timeout(refill_timeout) {
        shared
          .metrics
          .refill_timeouts
          .fetch_add(1, Ordering::Relaxed);
        continue;
      }

      if stop_flag.load(Ordering::Relaxed) {
        break;
      }

      // The whole batch is generated off-line and swapped in at once.
      if let Err(err) = source.fill(&mut scratch) {
        tracing::error!(error = %err, "batch source failed, producer loop is exiting");
        shared.mark_faulted(err.to_string());
        return Err(err);
      }
      gate.publish(&mut scratch);

      let produced = shared
        .metrics
        .batches_produced
        .fetch_add(1, Ordering::Relaxed)
        + 1;
      tracing::debug!(batch = produced, "published a fresh batch");
    }

    tracing::debug!("producer loop stopped");
    Ok(())
  }

  /// Asks the loop to exit. It is observed within one refill timeout.
  pub(crate) fn stop(&self) {
    self.stop_flag.store(true, Ordering::Relaxed);
  }

  /// `true` once the loop has exited, for whatever reason.
  pub(crate) fn is_finished(&self) -> bool {
    self.handle.is_finished()
  }

  /// Stops the loop and waits for the thread to exit.
  pub(crate) fn join(self) -> Result<(), DeviceError> {
    self.stop();
    match self.handle.join() {
      Ok(Ok(())) => Ok(()),
      Ok(Err(err)) => Err(DeviceError::ProducerFault(err.to_string())),
      Err(_) => Err(DeviceError::ProducerFault(
        "producer thread panicked".to_string(),
      )),
    }
  }
}
