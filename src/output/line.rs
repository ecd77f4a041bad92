//! # Line-buffering writer.
//!
//! [`LineWriter`] accumulates bytes and forwards them to its destination only
//! once a `\n` completes the line. Every complete line reaches the destination
//! in exactly one `write_all` call, so lines from concurrent writers sharing a
//! destination never interleave.
//!
//! ```text
//! write("ab")      → buffered "ab"
//! write("cd\n")    → dst.write_all("abcd\n")
//! write("x\ny\nz") → dst.write_all("x\n"), dst.write_all("y\n"), buffered "z"
//! ```
//!
//! The buffer is guarded by a mutex: one instance is shared by the stdout and
//! stderr pumps of the same shard.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

struct State<W> {
    dst: W,
    buf: Vec<u8>,
}

/// Writer that flushes to `dst` on complete lines only.
pub struct LineWriter<W> {
    state: Mutex<State<W>>,
}

impl<W: Write> LineWriter<W> {
    /// Wraps `dst`.
    pub fn new(dst: W) -> Self {
        Self {
            state: Mutex::new(State {
                dst,
                buf: Vec::new(),
            }),
        }
    }

    /// Buffers `p`, writing out every line it completes.
    ///
    /// Returns the number of bytes consumed. On a destination error the bytes
    /// up to and including the failed line count as consumed.
    pub fn write_bytes(&self, p: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let State { dst, buf } = &mut *state;

        let mut offset = 0;
        while offset < p.len() {
            let rest = &p[offset..];
            match rest.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    buf.extend_from_slice(&rest[..=pos]);
                    offset += pos + 1;
                    let res = dst.write_all(buf);
                    buf.clear();
                    res?;
                }
                None => {
                    buf.extend_from_slice(rest);
                    offset = p.len();
                }
            }
        }
        Ok(offset)
    }

    /// Writes out a pending partial line, if any, terminated with `\n`.
    pub fn finish(&self) -> io::Result<()> {
        let mut state = self.lock();
        let State { dst, buf } = &mut *state;
        if buf.is_empty() {
            return Ok(());
        }
        buf.push(b'\n');
        let res = dst.write_all(buf);
        buf.clear();
        res?;
        dst.flush()
    }

    /// Number of bytes waiting for a line separator.
    pub fn pending(&self) -> usize {
        self.lock().buf.len()
    }

    /// Consumes the writer, returning the destination and any pending bytes.
    pub fn into_parts(self) -> (W, Vec<u8>) {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (state.dst, state.buf)
    }

    fn lock(&self) -> MutexGuard<'_, State<W>> {
        // A panic mid-write leaves at worst a partial line in the buffer.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> Write for &LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().dst.flush()
    }
}
