//! # shardvisor
//!
//! **Shardvisor** runs several shards of a dedicated game server side by side
//! and treats them as one unit.
//!
//! It spawns one server process per shard, merges their output into a single
//! stream with a fixed-width `[<shard>] ` prefix per line, routes operator
//! console input to a selected shard, and shuts the whole cluster down as soon
//! as any shard stops or the operator asks for it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        ShardSet ["Master", "Caves"]          operator stdin
//!                 │                                  │
//!                 ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (runtime orchestrator)                                │
//! │  - Bus (broadcast events)                                         │
//! │  - ShutdownLatch (fire-once, shared by all monitors)              │
//! │  - InputRouter (":<shard>" selects, other lines are forwarded)    │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────────────┬─────────────────────────────────┘
//!        ▼                          ▼
//!   ┌──────────────┐          ┌──────────────┐
//!   │   monitor    │          │   monitor    │
//!   │ (one/shard)  │          │ (one/shard)  │
//!   └┬─────────────┘          └┬─────────────┘
//!    │ wait / interrupt once   │
//!    ▼                         ▼
//!   dst -shard Master         dst -shard Caves
//!    │ stdout+stderr           │ stdout+stderr
//!    ▼                         ▼
//!   LineWriter ─► PrefixWriter("[Master] ") ─┐
//!   LineWriter ─► PrefixWriter("[Caves ] ") ─┴─► SharedSink (stdout)
//!
//! monitors / router / supervisor ── publish ──► Bus ──► SubscriberSet ──► LogWriter (stderr)
//! ```
//!
//! ### Shutdown
//! ```text
//! any shard exits ───────┐
//! operator ^C / SIGTERM ─┴─► latch fires ─► every running shard gets one SIGINT
//!                                              (CTRL_BREAK on Windows)
//!   ├─ all shards exit     ─► exit code = last non-zero shard code (or 0)
//!   └─ second ^C / SIGTERM ─► exit immediately, shards are left behind
//! ```
//!
//! ## Features
//! | Area            | Description                                                       |
//! |-----------------|-------------------------------------------------------------------|
//! | **Output**      | Whole lines only; output of different shards never interleaves.   |
//! | **Input**       | `:Caves` selects a shard; every other line goes to its stdin.     |
//! | **Cascade**     | One shard stopping stops the cluster.                             |
//! | **Events**      | Typed [`Event`]s on a [`Bus`]; plug in a [`Subscribe`] of yours.  |
//! | **Process seam**| [`Launch`] / [`Shard`] let tests run the supervisor without OS processes. |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use shardvisor::{
//!     CommandLauncher, Config, LaunchSpec, LogWriter, ServerArgs, ShardSet, Subscribe,
//!     Supervisor,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ServerArgs {
//!         persistent_storage_root: "/srv/klei".into(),
//!         conf_dir: "DoNotStarveTogether".into(),
//!         cluster: "Cluster_1".into(),
//!         monitor_parent: Some(std::process::id()),
//!         ..ServerArgs::default()
//!     };
//!     let launcher = CommandLauncher::new(LaunchSpec {
//!         executable: "./dontstarve_dedicated_server_nullrenderer".into(),
//!         working_dir: "/srv/dst/bin".into(),
//!         base_args: args.base_args(),
//!     });
//!     let shards = ShardSet::new(["Master", "Caves"])?;
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let sup = Supervisor::new(Config::default(), subs);
//!     let code = sup.run(&launcher, &shards).await?;
//!     std::process::exit(code);
//! }
//! ```

mod cluster;
mod core;
mod error;
mod events;
mod input;
mod output;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use cluster::{ServerArgs, ShardSet, shard_args};
pub use self::core::{Config, ShutdownLatch, ShutdownSignals, Supervisor, spawn_listener};
pub use error::{ClusterError, ProcessError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use input::InputRouter;
pub use output::{LineWriter, PrefixWriter, SharedSink, ShardOutput, pump};
pub use process::{
    CommandLauncher, ExitOutcome, Launch, LaunchSpec, Launched, Shard, ShardInput, ShardProcess,
    ShardRef,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
