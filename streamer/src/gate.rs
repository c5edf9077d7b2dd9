//! The shared batch buffer and the non-blocking read path over it.
//!
//! A batch is only ever replaced wholesale: the producer fills an off-line buffer and
//! `publish` swaps it in under the gate lock, so a read can never observe a batch that is
//! half overwritten.

use crate::signal::RefillSignal;

use std::convert::Infallible;
use std::fmt;
use std::io::{self, Write};

use parking_lot::Mutex;

struct GateState {
  batch: Box<[u8]>,
  // Bytes of `batch` already delivered. Always in `0..=batch.len()`.
  cursor: usize,
  // Set by the read that drains a batch, cleared by the next `publish`.
  awaiting_refill: bool,
}

pub struct ReadGate {
  state: Mutex<GateState>,
  capacity: usize,
  signal: RefillSignal,
}

impl fmt::Debug for ReadGate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("ReadGate")
      .field("capacity", &self.capacity)
      .field("cursor", &state.cursor)
      .field("awaiting_refill", &state.awaiting_refill)
      .field("signal", &self.signal)
      .finish_non_exhaustive()
  }
}

impl ReadGate {
  /// Creates a gate whose first batch is `initial`. The batch length fixes the capacity.
  ///
  /// # Panics
  /// Panics if `initial` is empty.
  pub fn new(initial: Box<[u8]>) -> Self {
    assert!(!initial.is_empty(), "stream capacity must be greater than 0");
    let capacity = initial.len();
    Self {
      state: Mutex::new(GateState {
        batch: initial,
        cursor: 0,
        awaiting_refill: false,
      }),
      capacity,
      signal: RefillSignal::new(),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  #[inline]
  pub fn signal(&self) -> &RefillSignal {
    &self.signal
  }

  pub fn cursor(&self) -> usize {
    self.state.lock().cursor
  }

  /// `true` between the read that drained a batch and the publish of the next one.
  pub fn is_awaiting_refill(&self) -> bool {
    self.state.lock().awaiting_refill
  }

  /// Bytes of the current batch that have not been delivered yet.
  pub fn available(&self) -> usize {
    let state = self.state.lock();
    Self::available_in(&state, self.capacity)
  }

  /// A copy of the batch currently behind the gate, delivered bytes included.
  pub fn batch_snapshot(&self) -> Vec<u8> {
    self.state.lock().batch.to_vec()
  }

  /// Copies up to `dst.len()` bytes of the current batch into `dst` and returns the count.
  ///
  /// Never blocks. Returns 0 when `dst` is empty or while the producer has not published
  /// the batch that follows a drain.
  pub fn read(&self, dst: &mut [u8]) -> usize {
    let result = self.deliver(dst.len(), |bytes| {
      dst[..bytes.len()].copy_from_slice(bytes);
      Ok::<(), Infallible>(())
    });
    match result {
      Ok(n) => n,
      Err(never) => match never {},
    }
  }

  /// Writes up to `requested` bytes of the current batch into `sink`.
  ///
  /// If the sink fails, the error is returned and the cursor stays where it was, so the
  /// same bytes are offered again on the next read.
  pub fn read_into<W>(&self, requested: usize, sink: &mut W) -> io::Result<usize>
  where
    W: Write + ?Sized,
  {
    self.deliver(requested, |bytes| sink.write_all(bytes))
  }

  /// Swaps `next` in as the current batch and resets the cursor.
  ///
  /// On return `next` holds the previous batch, ready to be refilled off-line.
  ///
  /// # Panics
  /// Panics if `next` is not exactly `capacity` bytes long.
  pub fn publish(&self, next: &mut Box<[u8]>) {
    assert_eq!(next.len(), self.capacity, "published batch has the wrong length");
    let mut state = self.state.lock();
    std::mem::swap(&mut state.batch, next);
    state.cursor = 0;
    state.awaiting_refill = false;
  }

  #[inline]
  fn available_in(state: &GateState, capacity: usize) -> usize {
    if state.awaiting_refill {
      0
    } else {
      capacity.saturating_sub(state.cursor)
    }
  }

  fn deliver<E, F>(&self, requested: usize, copy: F) -> Result<usize, E>
  where
    F: FnOnce(&[u8]) -> Result<(), E>,
  {
    if requested == 0 {
      return Ok(0);
    }

    let mut state = self.state.lock();
    let n = requested.min(Self::available_in(&state, self.capacity));
    if n == 0 {
      return Ok(0);
    }

    let start = state.cursor;
    copy(&state.batch[start..start + n])?;

    state.cursor = start + n;
    if state.cursor >= self.capacity {
      state.cursor = 0;
      state.awaiting_refill = true;
      // Fired while still holding the gate lock: the producer cannot publish before the
      // drained state is recorded.
      self.signal.fire();
    }
    Ok(n)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gate_with(bytes: &[u8]) -> ReadGate {
    ReadGate::new(bytes.to_vec().into_boxed_slice())
  }

  struct FailingSink;

  impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
    }
    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn partial_then_short_read_drains_and_fires() {
    let gate = gate_with(&[0x01, 0x02, 0x03, 0x04]);
    let mut out = [0u8; 3];

    assert_eq!(gate.read(&mut out), 3);
    assert_eq!(out, [0x01, 0x02, 0x03]);
    assert_eq!(gate.cursor(), 3);
    assert!(!gate.signal().is_fired());

    let mut out = [0u8; 3];
    assert_eq!(gate.read(&mut out), 1);
    assert_eq!(out[0], 0x04);
    assert_eq!(gate.cursor(), 0);
    assert!(gate.signal().is_fired());
    assert_eq!(gate.signal().fired_total(), 1);
  }

  #[test]
  fn zero_request_is_a_no_op() {
    let gate = gate_with(&[9, 8, 7]);
    assert_eq!(gate.read(&mut []), 0);
    assert_eq!(gate.cursor(), 0);
    assert_eq!(gate.batch_snapshot(), vec![9, 8, 7]);
    assert!(!gate.signal().is_fired());
  }

  #[test]
  fn drained_gate_returns_zero_until_publish() {
    let gate = gate_with(&[1, 2]);
    let mut out = [0u8; 8];
    assert_eq!(gate.read(&mut out), 2);
    assert!(gate.is_awaiting_refill());
    assert_eq!(gate.read(&mut out), 0);
    assert_eq!(gate.available(), 0);

    let mut next = vec![3u8, 4].into_boxed_slice();
    gate.publish(&mut next);
    assert_eq!(&*next, &[1, 2]);
    assert!(!gate.is_awaiting_refill());
    assert_eq!(gate.read(&mut out), 2);
    assert_eq!(&out[..2], &[3, 4]);
    assert_eq!(gate.signal().fired_total(), 2);
  }

  #[test]
  #[should_panic(expected = "published batch has the wrong length")]
  fn publishing_a_short_batch_panics() {
    let gate = gate_with(&[1, 2, 3, 4]);
    let mut short = vec![9u8, 9].into_boxed_slice();
    gate.publish(&mut short);
  }

  #[test]
  fn failed_copy_leaves_cursor_untouched() {
    let gate = gate_with(&[1, 2, 3, 4]);
    let mut out = [0u8; 1];
    gate.read(&mut out);

    let err = gate.read_into(3, &mut FailingSink).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(gate.cursor(), 1);
    assert!(!gate.signal().is_fired());

    let mut sink = Vec::new();
    assert_eq!(gate.read_into(3, &mut sink).unwrap(), 3);
    assert_eq!(sink, vec![2, 3, 4]);
  }

  #[test]
  fn cursor_stays_within_capacity_for_any_split() {
    let gate = gate_with(&[0u8; 7]);
    let mut out = [0u8; 7];
    for requested in [1usize, 3, 0, 5, 2, 7, 4, 6].iter().cycle().take(40) {
      if gate.is_awaiting_refill() {
        let mut next = vec![0u8; 7].into_boxed_slice();
        gate.publish(&mut next);
      }
      let before = gate.cursor();
      let n = gate.read(&mut out[..*requested]);
      assert!(n <= *requested);
      assert!(gate.cursor() <= gate.capacity());
      assert!(before + n == gate.cursor() || gate.cursor() == 0);
    }
  }
}
