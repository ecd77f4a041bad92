//! # Shard output multiplexing.
//!
//! Each shard's stdout and stderr are copied by two pump tasks into one shared
//! [`LineWriter`], which hands complete lines to a [`PrefixWriter`] labelled with
//! the shard name, which in turn writes to the [`SharedSink`] all shards share:
//!
//! ```text
//! child stdout ─► pump ─┐
//!                       ├─► LineWriter ─► PrefixWriter("[Master] ") ─┐
//! child stderr ─► pump ─┘                                            ├─► SharedSink (terminal)
//! child stdout ─► pump ─┐                                            │
//!                       ├─► LineWriter ─► PrefixWriter("[Caves ] ") ─┘
//! child stderr ─► pump ─┘
//! ```

mod line;
mod prefix;
#[cfg(test)]
pub(crate) mod testing;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};

pub use line::LineWriter;
pub use prefix::PrefixWriter;

/// Output chain of one shard.
pub type ShardOutput = LineWriter<PrefixWriter<SharedSink>>;

/// Cloneable handle to the destination every shard writes into.
///
/// Each `write` holds the lock for the whole call, so a line handed over in one
/// `write_all` is never split by another shard's line.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl SharedSink {
    /// Wraps an arbitrary writer.
    pub fn new(dst: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dst)),
        }
    }

    /// The process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut dst = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        dst.write_all(buf)?;
        dst.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).flush()
    }
}

/// Copies `reader` into `out` until EOF, in chunks of at most `chunk` bytes.
///
/// Returns the number of bytes copied. A partial last line stays buffered in
/// `out`; call [`LineWriter::finish`] once every pump sharing it is done.
pub async fn pump<R, W>(mut reader: R, out: Arc<LineWriter<W>>, chunk: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut buf = vec![0u8; chunk.max(1)];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        let mut written = 0;
        while written < n {
            written += out.write_bytes(&buf[written..n])?;
        }
        total += n as u64;
    }
}
