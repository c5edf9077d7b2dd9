#![allow(dead_code)]

use fibre_streamer::{SequenceSource, StreamHandle, Streamer};
use std::thread;
use std::time::{Duration, Instant};

pub const FAST_REFILL_TIMEOUT: Duration = Duration::from_millis(20);
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(500);
pub const LONG_TIMEOUT: Duration = Duration::from_secs(5);

/// A device backed by the deterministic counter source, starting at 0.
pub fn sequence_streamer(capacity: usize) -> Streamer {
  Streamer::builder()
    .capacity(capacity)
    .refill_timeout(FAST_REFILL_TIMEOUT)
    .source(SequenceSource::new())
    .build()
    .unwrap()
}

/// Reads until exactly `total` bytes have been collected, retrying on empty reads.
pub fn read_exactly(handle: &mut StreamHandle, total: usize, chunk: usize) -> Vec<u8> {
  let deadline = Instant::now() + LONG_TIMEOUT;
  let mut collected = Vec::with_capacity(total);
  let mut buf = vec![0u8; chunk];
  while collected.len() < total {
    assert!(Instant::now() < deadline, "timed out after {} bytes", collected.len());
    let want = chunk.min(total - collected.len());
    let n = handle.read(&mut buf[..want]).unwrap();
    if n == 0 {
      thread::yield_now();
      continue;
    }
    collected.extend_from_slice(&buf[..n]);
  }
  collected
}

/// The bytes `SequenceSource::new()` produces, in order.
pub fn expected_sequence(len: usize) -> Vec<u8> {
  (0..len).map(|i| (i % 256) as u8).collect()
}
