//! Opens a stream device, polls it and prints every byte as `0xNN` on its own line.
//!
//! Stops on Ctrl-C, or after `--max-bytes` bytes.

mod config;
mod hex;

use crate::config::ReaderConfig;
use crate::hex::HexSink;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fibre_streamer::{StreamHandle, StreamerBuilder};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stream-reader")]
#[command(about = "Polls a simulated stream device and prints each byte in hexadecimal.", long_about = None)]
struct Cli {
  /// YAML configuration file. Command-line flags override its values.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Batch size of the device, in bytes.
  #[arg(long)]
  capacity: Option<usize>,

  /// Bytes requested per read call.
  #[arg(long)]
  read_size: Option<usize>,

  /// Delay between read calls, e.g. `20us` or `1s`.
  #[arg(long, value_parser = humantime::parse_duration)]
  poll_interval: Option<Duration>,

  /// How long the producer waits for a refill request before re-checking for shutdown.
  #[arg(long, value_parser = humantime::parse_duration)]
  refill_timeout: Option<Duration>,

  /// Stop after printing this many bytes.
  #[arg(long)]
  max_bytes: Option<u64>,
}

impl Cli {
  fn resolve(&self) -> Result<ReaderConfig> {
    let mut config = match &self.config {
      Some(path) => ReaderConfig::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?,
      None => ReaderConfig::default(),
    };
    if let Some(capacity) = self.capacity {
      config.streamer.capacity = capacity;
    }
    if let Some(read_size) = self.read_size {
      config.read_size = read_size;
    }
    if let Some(poll_interval) = self.poll_interval {
      config.poll_interval = poll_interval;
    }
    if let Some(refill_timeout) = self.refill_timeout {
      config.streamer.refill_timeout = refill_timeout;
    }
    if self.max_bytes.is_some() {
      config.max_bytes = self.max_bytes;
    }
    config.validate().context("invalid reader configuration")?;
    Ok(config)
  }
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  match try_main() {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("{:#}", err);
      ExitCode::FAILURE
    }
  }
}

fn try_main() -> Result<()> {
  let cli = Cli::parse();
  let config = cli.resolve()?;

  let device = StreamerBuilder::from_config(&config.streamer)
    .build()
    .context("failed to start the stream device")?;
  let handle = device.open().context("failed to open the stream device")?;

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("failed to start the async runtime")?;
  let printed = runtime.block_on(poll(handle, &config, HexSink::new(io::stdout())));

  let shutdown = device.shutdown().context("stream device stopped with a fault");
  let printed = printed?;
  shutdown?;
  tracing::info!(bytes = printed, "reader finished");
  Ok(())
}

/// Reads on every poll tick until interrupted or `max_bytes` is reached.
///
/// An empty read means the next batch is not published yet; the loop simply tries again on
/// the next tick, since the device never reports end of stream.
async fn poll<W: Write>(
  mut handle: StreamHandle,
  config: &ReaderConfig,
  mut sink: HexSink<W>,
) -> Result<u64> {
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  let mut printed = 0u64;
  loop {
    if config.max_bytes.is_some_and(|max| printed >= max) {
      break;
    }

    let requested = match config.max_bytes {
      Some(max) => config.read_size.min((max - printed) as usize),
      None => config.read_size,
    };
    let delivered = handle
      .read_into(requested, &mut sink)
      .context("read from the stream device failed")?;
    printed += delivered as u64;

    tokio::select! {
      result = &mut ctrl_c => {
        result.context("failed to listen for Ctrl-C")?;
        tracing::info!("interrupt received, exiting");
        break;
      }
      _ = tokio::time::sleep(config.poll_interval) => {}
    }
  }

  sink.flush().context("failed to flush output")?;
  handle.close();
  Ok(printed)
}
