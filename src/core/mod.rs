//! Runtime core: orchestration and lifecycle.
//!
//! The only entry point for a run is [`Supervisor`], which spawns the shards,
//! monitors them and drives the cascading shutdown.
//!
//! Internal modules:
//! - [`supervisor`]: starts shards in order, waits for them, handles forced exit;
//! - [`monitor`]: one task per shard, interrupts it once the latch fires;
//! - [`latch`]: fire-once shutdown signal shared by all monitors;
//! - [`shutdown`]: cross-platform OS signal handling;
//! - [`config`]: runtime knobs.

mod config;
mod latch;
mod monitor;
mod shutdown;
mod supervisor;

pub use config::Config;
pub use latch::ShutdownLatch;
pub use shutdown::{ShutdownSignals, spawn_listener};
pub use supervisor::Supervisor;
