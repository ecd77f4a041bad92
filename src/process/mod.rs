//! # Shard processes.
//!
//! The supervisor only ever talks to shards through two narrow traits:
//! - [`Launch`] starts one shard by name and hands back its [`Shard`] handle
//!   and stdin pipe;
//! - [`Shard`] can be interrupted and waited on.
//!
//! [`CommandLauncher`] / [`ShardProcess`] are the real, tokio-process backed
//! implementations; everything OS-specific is confined to [`sys`].

mod child;
mod sys;

use std::fmt;
use std::process::ExitStatus;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::ProcessError;

pub use child::{CommandLauncher, LaunchSpec, ShardProcess};

/// Write half of a shard's stdin pipe.
pub type ShardInput = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle to a supervised shard.
pub type ShardRef = Arc<dyn Shard>;

/// Terminal outcome of a shard process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited with code 0.
    Success,
    /// Exited with a non-zero code.
    Code(i32),
    /// Terminated without an exit code (e.g. killed by a signal).
    Signaled,
    /// The OS-level wait itself failed.
    WaitFailed(String),
}

impl ExitOutcome {
    /// Exit code recorded in the aggregate: `0` only for [`ExitOutcome::Success`].
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Code(code) => *code,
            ExitOutcome::Signaled | ExitOutcome::WaitFailed(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => ExitOutcome::Success,
            Some(code) => ExitOutcome::Code(code),
            None => ExitOutcome::Signaled,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Success => f.write_str("exited cleanly"),
            ExitOutcome::Code(code) => write!(f, "exit code {code}"),
            ExitOutcome::Signaled => f.write_str("terminated by signal"),
            ExitOutcome::WaitFailed(err) => write!(f, "wait failed: {err}"),
        }
    }
}

/// # One running shard.
///
/// `interrupt` must be safe to call while the process is exiting; it reports
/// [`ProcessError::NotRunning`] once the exit has been observed. The supervisor
/// calls `wait` exactly once.
#[async_trait]
pub trait Shard: Send + Sync + 'static {
    /// Shard name.
    fn name(&self) -> &str;

    /// Requests a graceful shutdown.
    fn interrupt(&self) -> Result<(), ProcessError>;

    /// Waits until the process terminates.
    async fn wait(&self) -> ExitOutcome;
}

/// A started shard and the write half of its stdin.
pub struct Launched {
    pub shard: ShardRef,
    pub stdin: Option<ShardInput>,
}

/// # Starts shards.
pub trait Launch: Send + Sync {
    /// Spawns shard `name`; `label` prefixes each of its output lines.
    fn launch(&self, name: &str, label: &str) -> Result<Launched, ProcessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_codes() {
        assert_eq!(ExitOutcome::Success.code(), 0);
        assert_eq!(ExitOutcome::Code(2).code(), 2);
        assert_eq!(ExitOutcome::Signaled.code(), 1);
        assert_eq!(ExitOutcome::WaitFailed("ECHILD".into()).code(), 1);
        assert!(ExitOutcome::Success.is_success());
        assert!(!ExitOutcome::Code(0x7f).is_success());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ExitOutcome::Code(2).to_string(), "exit code 2");
        assert_eq!(
            ExitOutcome::WaitFailed("no child".into()).to_string(),
            "wait failed: no child"
        );
    }
}
