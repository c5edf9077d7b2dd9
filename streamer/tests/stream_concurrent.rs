mod common;
use common::*;

use fibre_streamer::{SequenceSource, Streamer};
use serial_test::serial;
use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

// Every byte of every batch must arrive exactly once and in order, whatever the split.
#[test]
#[serial]
fn back_to_back_reads_see_every_batch_exactly_once() {
  let capacity = 64;
  let batches = 200;
  let device = sequence_streamer(capacity);
  let mut handle = device.open().unwrap();

  let collected = read_exactly(&mut handle, capacity * batches, 7);

  assert_eq!(collected, expected_sequence(capacity * batches));
  let metrics = device.metrics();
  assert_eq!(metrics.bytes_delivered, (capacity * batches) as u64);
  assert_eq!(metrics.refills_requested, batches as u64);
}

#[test]
#[serial]
fn slow_source_never_exposes_a_half_written_batch() {
  let capacity = 32;
  let mut next = 0u8;
  let device = Streamer::builder()
    .capacity(capacity)
    .refill_timeout(FAST_REFILL_TIMEOUT)
    .source(move |batch: &mut [u8]| {
      // Every byte of a batch carries the batch number; a torn read would mix two.
      for byte in batch.iter_mut() {
        *byte = next;
        thread::yield_now();
      }
      next = next.wrapping_add(1);
      Ok(())
    })
    .build()
    .unwrap();
  let mut handle = device.open().unwrap();

  for batch in 0..20u8 {
    let bytes = read_exactly(&mut handle, capacity, 5);
    assert!(bytes.iter().all(|b| *b == batch), "batch {} was torn: {:?}", batch, bytes);
  }
}

#[test]
#[serial]
fn reader_thread_with_poll_interval() {
  let device = sequence_streamer(16);
  let mut handle = device.open().unwrap();

  let reader = thread::spawn(move || {
    let deadline = Instant::now() + LONG_TIMEOUT;
    let mut collected = Vec::new();
    let mut buf = [0u8; 3];
    while collected.len() < 64 && Instant::now() < deadline {
      match handle.read(&mut buf) {
        Ok(n) => collected.extend_from_slice(&buf[..n]),
        Err(err) => panic!("read failed: {}", err),
      }
      thread::sleep(Duration::from_micros(200));
    }
    collected
  });

  let collected = reader.join().unwrap();
  assert_eq!(collected, expected_sequence(64));
}

#[test]
#[serial]
fn io_read_adapter_retries_on_would_block() {
  let device = Streamer::builder()
    .capacity(8)
    .refill_timeout(FAST_REFILL_TIMEOUT)
    .source(SequenceSource::starting_at(100))
    .build()
    .unwrap();
  let mut handle = device.open().unwrap();

  let deadline = Instant::now() + LONG_TIMEOUT;
  let mut collected = Vec::new();
  let mut buf = [0u8; 8];
  while collected.len() < 24 {
    assert!(Instant::now() < deadline);
    match Read::read(&mut handle, &mut buf) {
      Ok(n) => {
        assert!(n > 0, "io::Read must not report end of stream");
        collected.extend_from_slice(&buf[..n]);
      }
      Err(err) if err.kind() == io::ErrorKind::WouldBlock => thread::yield_now(),
      Err(err) => panic!("unexpected error: {}", err),
    }
  }

  let expected: Vec<u8> = (100..124).collect();
  assert_eq!(collected, expected);
}
