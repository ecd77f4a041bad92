//! # LogWriter: event renderer for operator diagnostics
//!
//! [`LogWriter`] turns every [`Event`] into one human-readable `tracing` record.
//! The binary routes those records to stderr, keeping stdout free for the
//! prefixed shard output.
//!
//! ## Example output
//! ```text
//! INFO starting cluster with 2 shard(s): Master, Caves
//! WARN shard exited abnormally shard=Master code=2 reason=exit code 2
//! WARN shard stopped, shutting down the rest of the cluster shard=Master
//! INFO waiting for 1 shard(s) to stop; interrupt again to exit immediately
//! INFO all shards stopped code=2
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Diagnostics subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let shard = e.shard.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let count = e.count.unwrap_or(0);

        match e.kind {
            EventKind::ClusterStarting => {
                info!("starting cluster with {count} shard(s): {reason}");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested, interrupting all shards");
            }
            EventKind::CascadeTriggered => {
                warn!(shard, "shard stopped, shutting down the rest of the cluster");
            }
            EventKind::WaitingForShards => {
                info!("waiting for {count} shard(s) to stop; interrupt again to exit immediately");
            }
            EventKind::ForcedExit => {
                warn!("exiting without waiting for {count} shard(s)");
            }
            EventKind::AllStopped => {
                info!(code = e.code.unwrap_or(0), "all shards stopped");
            }
            EventKind::SignalUnavailable => {
                error!(reason, "cannot listen for termination signals");
            }
            EventKind::ShardStarted => {
                info!(shard, "shard started");
            }
            EventKind::ShardSpawnFailed => {
                error!(shard, reason, "shard failed to start");
            }
            EventKind::ShardNotStarted => {
                warn!(shard, reason, "shard not started");
            }
            EventKind::ShardExited => {
                info!(shard, "shard exited");
            }
            EventKind::ShardFailed => {
                warn!(shard, code = e.code.unwrap_or(1), reason, "shard exited abnormally");
            }
            EventKind::InterruptSent => {
                debug!(shard, "interrupt sent");
            }
            EventKind::InterruptFailed => {
                warn!(shard, reason, "cannot interrupt shard");
            }
            EventKind::InputSelected => {
                info!("forwarding input to shard {shard}");
            }
            EventKind::InputUnknownShard => {
                warn!("unknown shard {shard:?}");
            }
            EventKind::InputDropped => {
                warn!("no shard selected, input dropped; {reason}");
            }
            EventKind::InputForwardFailed => {
                warn!(shard, reason, "cannot forward input");
            }
            EventKind::InputClosed => {
                debug!(reason, "input forwarding stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = shard, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = shard, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
