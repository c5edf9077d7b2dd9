use std::fmt::Write as _;
use std::io::{self, Write};

/// Renders every byte written to it as a `0xNN` line on the inner writer.
///
/// A whole chunk is formatted before anything reaches the inner writer, so a chunk is
/// either printed completely or reported as failed.
#[derive(Debug)]
pub struct HexSink<W> {
  inner: W,
  line_buf: String,
}

impl<W: Write> HexSink<W> {
  pub fn new(inner: W) -> Self {
    Self {
      inner,
      line_buf: String::new(),
    }
  }
}

impl<W: Write> Write for HexSink<W> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.line_buf.clear();
    for byte in buf {
      // Formatting into a String cannot fail.
      let _ = writeln!(self.line_buf, "0x{:02X}", byte);
    }
    self.inner.write_all(self.line_buf.as_bytes())?;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    self.inner.flush()
  }
}
