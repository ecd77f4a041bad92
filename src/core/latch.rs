//! # Fire-once shutdown latch.
//!
//! [`ShutdownLatch`] is the single source of truth for "shutdown has begun".
//! It fires at most once per run; every clone observes the same state and any
//! number of tasks can await [`ShutdownLatch::fired`] concurrently.
//!
//! ```text
//! monitor A exits ──► trigger() == true   ──► announce cascade, token cancelled
//! monitor B exits ──► trigger() == false  ──► nothing (already shutting down)
//! operator ^C     ──► trigger() == false  ──► nothing
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Broadcast, fire-once shutdown signal.
#[derive(Clone, Debug, Default)]
pub struct ShutdownLatch {
    fired: Arc<AtomicBool>,
    token: CancellationToken,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the latch. Returns `true` only for the caller that fired it.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the latch has fired.
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Completes once the latch has fired.
    pub fn fired(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
