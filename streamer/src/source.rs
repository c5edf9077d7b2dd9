//! Pluggable batch generation for the producer loop.

use crate::error::SourceError;

/// Generates the contents of one batch.
///
/// `fill` must overwrite every byte of `batch`. The producer calls it on a scratch buffer,
/// never on the batch readers can currently see, so an implementation may take as long as
/// it needs. Any error is fatal to the producer loop.
pub trait BatchSource: Send + 'static {
  fn fill(&mut self, batch: &mut [u8]) -> Result<(), SourceError>;
}

impl<F> BatchSource for F
where
  F: FnMut(&mut [u8]) -> Result<(), SourceError> + Send + 'static,
{
  fn fill(&mut self, batch: &mut [u8]) -> Result<(), SourceError> {
    self(batch)
  }
}

/// Uniform-random bytes.
#[cfg(feature = "random")]
#[derive(Debug)]
pub struct RandomSource {
  rng: rand::rngs::StdRng,
}

#[cfg(feature = "random")]
impl RandomSource {
  pub fn new() -> Self {
    use rand::SeedableRng;
    Self {
      rng: rand::rngs::StdRng::from_os_rng(),
    }
  }

  /// A reproducible stream of random batches.
  pub fn seeded(seed: u64) -> Self {
    use rand::SeedableRng;
    Self {
      rng: rand::rngs::StdRng::seed_from_u64(seed),
    }
  }
}

#[cfg(feature = "random")]
impl Default for RandomSource {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(feature = "random")]
impl BatchSource for RandomSource {
  fn fill(&mut self, batch: &mut [u8]) -> Result<(), SourceError> {
    use rand::RngCore;
    self.rng.fill_bytes(batch);
    Ok(())
  }
}

/// A deterministic source: a running byte counter that continues across batches.
///
/// With a capacity of fewer than 256 bytes, two consecutive batches never share a value at
/// any position, which makes stale or duplicated deliveries easy to spot in tests.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
  next: u8,
}

impl SequenceSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn starting_at(first: u8) -> Self {
    Self { next: first }
  }
}

impl BatchSource for SequenceSource {
  fn fill(&mut self, batch: &mut [u8]) -> Result<(), SourceError> {
    for byte in batch.iter_mut() {
      *byte = self.next;
      self.next = self.next.wrapping_add(1);
    }
    Ok(())
  }
}
