//! # Runtime events emitted by the supervisor, shard monitors and input router.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Cluster events**: startup summary, shutdown progress, final state
//! - **Shard events**: spawn, exit, interrupt delivery
//! - **Input events**: operator selection and forwarding diagnostics
//! - **Subscriber events**: overflow and panic reports from subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, shard name,
//! exit codes and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use shardvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ShardFailed)
//!     .with_shard("Master")
//!     .with_code(2);
//!
//! assert_eq!(ev.kind, EventKind::ShardFailed);
//! assert_eq!(ev.shard.as_deref(), Some("Master"));
//! assert_eq!(ev.code, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Cluster events ===
    /// Supervisor is about to start the shard set.
    ///
    /// Sets:
    /// - `count`: number of shards
    /// - `reason`: comma separated shard names
    ClusterStarting,

    /// Operator requested termination (OS signal observed) and shutdown begins.
    ShutdownRequested,

    /// A shard terminated while the cluster was running; all others get interrupted.
    ///
    /// Sets:
    /// - `shard`: shard whose exit triggered the cascade
    CascadeTriggered,

    /// Shutdown in progress; waiting for the remaining shards.
    ///
    /// Sets:
    /// - `count`: shards still running
    WaitingForShards,

    /// A second termination request arrived; the supervisor stops waiting.
    ///
    /// Sets:
    /// - `count`: shards still running
    ForcedExit,

    /// Every shard reached a terminal outcome.
    ///
    /// Sets:
    /// - `code`: aggregate exit code
    AllStopped,

    /// OS signal listeners could not be installed.
    ///
    /// Sets:
    /// - `reason`: OS error message
    SignalUnavailable,

    // === Shard events ===
    /// Shard process spawned.
    ///
    /// Sets:
    /// - `shard`: shard name
    ShardStarted,

    /// Shard process could not be spawned.
    ///
    /// Sets:
    /// - `shard`: shard name
    /// - `reason`: spawn error
    ShardSpawnFailed,

    /// Shard was never launched because shutdown began during startup.
    ///
    /// Sets:
    /// - `shard`: shard name
    /// - `reason`: why it was skipped
    ShardNotStarted,

    /// Shard process exited cleanly (code 0).
    ///
    /// Sets:
    /// - `shard`: shard name
    /// - `code`: always `0`
    ShardExited,

    /// Shard process exited abnormally, or waiting on it failed.
    ///
    /// Sets:
    /// - `shard`: shard name
    /// - `code`: recorded exit code
    /// - `reason`: outcome description
    ShardFailed,

    /// Interrupt delivered to a shard.
    ///
    /// Sets:
    /// - `shard`: shard name
    InterruptSent,

    /// Interrupt delivery failed (non-fatal).
    ///
    /// Sets:
    /// - `shard`: shard name
    /// - `reason`: error message
    InterruptFailed,

    // === Input events ===
    /// Operator selected a shard as forwarding target.
    ///
    /// Sets:
    /// - `shard`: selected shard
    InputSelected,

    /// Operator selected a shard that is not part of the cluster.
    ///
    /// Sets:
    /// - `shard`: requested name
    InputUnknownShard,

    /// Input line dropped because no shard is selected.
    InputDropped,

    /// Writing to the selected shard's stdin failed.
    ///
    /// Sets:
    /// - `shard`: selected shard
    /// - `reason`: I/O error
    InputForwardFailed,

    /// Input router stopped; no more stdin forwarding for this run.
    ///
    /// Sets:
    /// - `reason`: why the router stopped
    InputClosed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `shard`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `shard`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the shard (or subscriber), if applicable.
    pub shard: Option<Arc<str>>,
    /// Exit code (shard or aggregate).
    pub code: Option<i32>,
    /// Shard count.
    pub count: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            shard: None,
            code: None,
            count: None,
            reason: None,
        }
    }

    /// Attaches a shard name.
    #[inline]
    pub fn with_shard(mut self, shard: impl Into<Arc<str>>) -> Self {
        self.shard = Some(shard.into());
        self
    }

    /// Attaches an exit code.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches a shard count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_shard(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_shard(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    ///
    /// These are never re-published by subscriber workers to avoid feedback loops.
    #[inline]
    pub fn is_subscriber_report(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
