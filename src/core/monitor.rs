//! # Shard monitor: one task per shard.
//!
//! Waits for its shard to exit while listening on the [`ShutdownLatch`]:
//!
//! ```text
//! select (biased) {
//!   shard.wait()    ─► record outcome
//!   latch.fired()   ─► interrupt once ─► shard.wait() ─► record outcome
//! }
//! record outcome:
//!   ├─► publish ShardExited / ShardFailed, store non-zero code
//!   ├─► running -= 1
//!   └─► latch.trigger() == true ─► publish CascadeTriggered
//! ```
//!
//! ## Rules
//! - A shard is interrupted **at most once**, and never after its exit was seen.
//! - `NotRunning` from an interrupt is not reported: the shard is already exiting.
//! - The cascade is announced only by the monitor that actually fired the latch.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use crate::core::latch::ShutdownLatch;
use crate::error::ProcessError;
use crate::events::{Bus, Event, EventKind};
use crate::process::{ExitOutcome, ShardRef};

/// State shared by all monitors of one run.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    /// Aggregate exit code; the last non-zero store wins.
    exit_code: AtomicI32,
    /// Shards that have not reached a terminal outcome yet.
    running: AtomicUsize,
}

impl RunState {
    pub(crate) fn started(&self) {
        self.running.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn stopped(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    /// Stores `code` unless it is zero.
    pub(crate) fn record(&self, code: i32) {
        if code != 0 {
            self.exit_code.store(code, Ordering::Release);
        }
    }

    pub(crate) fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::Acquire)
    }
}

/// Supervises `shard` until it reaches a terminal outcome.
pub(crate) async fn watch(shard: ShardRef, latch: ShutdownLatch, state: Arc<RunState>, bus: Bus) {
    let wait = shard.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        biased;
        outcome = &mut wait => outcome,
        _ = latch.fired() => {
            match shard.interrupt() {
                Ok(()) => bus.publish(
                    Event::new(EventKind::InterruptSent).with_shard(shard.name()),
                ),
                // Exited on its own; `wait` reports the outcome.
                Err(ProcessError::NotRunning { .. }) => {}
                Err(e) => bus.publish(
                    Event::new(EventKind::InterruptFailed)
                        .with_shard(shard.name())
                        .with_reason(e.to_string()),
                ),
            }
            wait.await
        }
    };

    publish_outcome(&bus, shard.name(), &outcome);
    state.record(outcome.code());
    state.stopped();

    if latch.trigger() {
        bus.publish(Event::new(EventKind::CascadeTriggered).with_shard(shard.name()));
    }
}

fn publish_outcome(bus: &Bus, name: &str, outcome: &ExitOutcome) {
    let ev = if outcome.is_success() {
        Event::new(EventKind::ShardExited).with_code(0)
    } else {
        Event::new(EventKind::ShardFailed)
            .with_code(outcome.code())
            .with_reason(outcome.to_string())
    };
    bus.publish(ev.with_shard(name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_non_zero_code_wins() {
        let state = RunState::default();
        state.record(0);
        assert_eq!(state.exit_code(), 0);

        state.record(2);
        state.record(0);
        state.record(3);
        assert_eq!(state.exit_code(), 3);
    }

    #[test]
    fn test_running_count() {
        let state = RunState::default();
        state.started();
        state.started();
        state.stopped();
        assert_eq!(state.running(), 1);
    }
}
