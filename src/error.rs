//! Error types used by the shardvisor runtime and its shard processes.
//!
//! This module defines three error enums:
//!
//! - [`ProcessError`]: failures of a single shard process (spawn, interrupt).
//! - [`RuntimeError`]: failures of the supervision run as a whole.
//! - [`ClusterError`]: an invalid shard set handed over by the caller.
//!
//! Each type provides `as_label` (stable snake_case label for logs).

use std::io;

use thiserror::Error;

/// # Errors produced by a single shard process.
///
/// None of these are fatal to the supervisor on their own: spawn failures
/// trigger a cascade, interrupt failures are reported and ignored.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The executable could not be found or spawned.
    #[error("failed to spawn shard {shard:?}: {source}")]
    Spawn {
        /// Shard that failed to start.
        shard: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The process has already exited (or was never started).
    #[error("shard {shard:?} is not running")]
    NotRunning {
        /// Shard name.
        shard: String,
    },

    /// The spawned process did not report a process id.
    #[error("shard {shard:?} has no process id")]
    MissingPid {
        /// Shard name.
        shard: String,
    },

    /// The OS refused to deliver the interrupt.
    #[error("failed to interrupt shard {shard:?}: {reason}")]
    Interrupt {
        /// Shard name.
        shard: String,
        /// OS error message.
        reason: String,
    },
}

impl ProcessError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use shardvisor::ProcessError;
    ///
    /// let err = ProcessError::NotRunning { shard: "Caves".into() };
    /// assert_eq!(err.as_label(), "process_not_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Spawn { .. } => "process_spawn",
            ProcessError::NotRunning { .. } => "process_not_running",
            ProcessError::MissingPid { .. } => "process_missing_pid",
            ProcessError::Interrupt { .. } => "process_interrupt",
        }
    }

    /// Name of the shard the error belongs to.
    pub fn shard(&self) -> &str {
        match self {
            ProcessError::Spawn { shard, .. }
            | ProcessError::NotRunning { shard }
            | ProcessError::MissingPid { shard }
            | ProcessError::Interrupt { shard, .. } => shard,
        }
    }
}

/// # Errors produced by the supervision run itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The first shard could not be spawned; nothing was started.
    #[error("cluster failed to start: {0}")]
    Spawn(#[from] ProcessError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Spawn(_) => "runtime_spawn",
        }
    }
}

/// # Errors produced while building a [`ShardSet`](crate::ShardSet).
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClusterError {
    /// No shard names were given.
    #[error("cluster does not contain any shard")]
    NoShards,

    /// A shard name was empty or whitespace only.
    #[error("shard name must not be empty")]
    EmptyShardName,

    /// The same shard name was given twice.
    #[error("shard {0:?} is listed more than once")]
    DuplicateShard(String),
}

impl ClusterError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use shardvisor::ClusterError;
    ///
    /// assert_eq!(ClusterError::NoShards.as_label(), "cluster_no_shards");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClusterError::NoShards => "cluster_no_shards",
            ClusterError::EmptyShardName => "cluster_empty_shard_name",
            ClusterError::DuplicateShard(_) => "cluster_duplicate_shard",
        }
    }
}
