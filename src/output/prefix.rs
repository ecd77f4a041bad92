//! # Prefix writer.
//!
//! [`PrefixWriter`] renders every write request as `prefix + payload` and hands
//! it to the destination in one `write_all` call. It performs no buffering:
//! put it behind a [`LineWriter`](super::LineWriter) to get one prefix per line.

use std::io::{self, Write};

/// Writer that prepends a fixed label to every write.
#[derive(Debug, Clone)]
pub struct PrefixWriter<W> {
    dst: W,
    prefix: String,
}

impl<W: Write> PrefixWriter<W> {
    /// Wraps `dst`, labelling every write with `prefix`.
    pub fn new(dst: W, prefix: impl Into<String>) -> Self {
        Self {
            dst,
            prefix: prefix.into(),
        }
    }
}

impl<W: Write> Write for PrefixWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut line = Vec::with_capacity(self.prefix.len() + buf.len());
        line.extend_from_slice(self.prefix.as_bytes());
        line.extend_from_slice(buf);
        self.dst.write_all(&line)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.dst.flush()
    }
}
