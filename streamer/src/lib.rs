//! A simulated read-only streaming device.
//!
//! A background producer fills a fixed-capacity batch of bytes; a single consumer drains it
//! through non-blocking partial reads. When a read delivers the last byte of a batch, the
//! producer is signaled and publishes the next batch. Until then, reads return 0.
//!
//! ```no_run
//! use fibre_streamer::Streamer;
//! use std::time::Duration;
//!
//! let device = Streamer::builder()
//!   .capacity(64)
//!   .refill_timeout(Duration::from_millis(500))
//!   .build()?;
//!
//! let mut handle = device.open()?;
//! let mut buf = [0u8; 16];
//! let n = handle.read(&mut buf)?;
//! println!("{:02X?}", &buf[..n]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod device;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod signal;
pub mod source;

// Internal, crate-only modules
mod producer;
mod shared;

// Re-export the primary user-facing types for convenience
pub use builder::StreamerBuilder;
pub use config::StreamerConfig;
pub use device::{StreamHandle, Streamer};
pub use error::{BuildError, ConfigError, DeviceError, SourceError};
pub use metrics::MetricsSnapshot;
#[cfg(feature = "random")]
pub use source::RandomSource;
pub use source::{BatchSource, SequenceSource};
