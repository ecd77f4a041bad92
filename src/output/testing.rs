//! Recording sink for output tests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Records every `write` call as one entry.
#[derive(Clone, Default)]
pub(crate) struct Capture {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl Capture {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn concat(&self) -> Vec<u8> {
        self.writes().concat()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.writes.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
