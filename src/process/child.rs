//! # Tokio-backed shard process.
//!
//! [`CommandLauncher`] spawns the dedicated server once per shard:
//!
//! ```text
//! <executable> <base args...> -shard <name>     (cwd = working_dir)
//!     stdin  ◄── piped (handed to the input router)
//!     stdout ──► pump ─┐
//!     stderr ──► pump ─┴─► LineWriter ─► PrefixWriter(label) ─► SharedSink
//! ```
//!
//! ## Rules
//! - Every child runs in its own process group (see [`sys`](super::sys)).
//! - The stdin pipe is always created, even when no router is attached.
//! - [`ShardProcess::wait`] returns only after both pumps drained (bounded by
//!   [`OUTPUT_DRAIN`]) and the shard's last partial line was written out.

use std::future::poll_fn;
use std::path::PathBuf;
use std::pin::pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::task::{Poll, ready};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::cluster::shard_args;
use crate::error::ProcessError;
use crate::output::{self, LineWriter, PrefixWriter, SharedSink, ShardOutput};

use super::{ExitOutcome, Launch, Launched, Shard, ShardInput, sys};

/// How long `wait` keeps draining output after the process exited.
///
/// Grandchildren that inherited the pipes can keep them open indefinitely.
pub const OUTPUT_DRAIN: Duration = Duration::from_secs(2);

/// What to run for every shard.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Server executable.
    pub executable: PathBuf,
    /// Working directory of every shard.
    pub working_dir: PathBuf,
    /// Arguments common to all shards (`-shard <name>` is appended per shard).
    pub base_args: Vec<String>,
}

/// Spawns shards as OS processes writing into a shared sink.
pub struct CommandLauncher {
    spec: LaunchSpec,
    sink: SharedSink,
    chunk: usize,
}

impl CommandLauncher {
    /// Creates a launcher writing shard output to stdout.
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            sink: SharedSink::stdout(),
            chunk: 8 * 1024,
        }
    }

    /// Redirects shard output into `sink`.
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the read size of the output pumps (clamped to at least 1).
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }
}

impl Launch for CommandLauncher {
    fn launch(&self, name: &str, label: &str) -> Result<Launched, ProcessError> {
        let mut cmd = Command::new(&self.spec.executable);
        cmd.args(shard_args(&self.spec.base_args, name))
            .current_dir(&self.spec.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        sys::configure(&mut cmd);

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            shard: name.to_string(),
            source,
        })?;

        let out: Arc<ShardOutput> = Arc::new(LineWriter::new(PrefixWriter::new(
            self.sink.clone(),
            label,
        )));
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(output::pump(stdout, out.clone(), self.chunk)));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(output::pump(stderr, out.clone(), self.chunk)));
        }
        let stdin = child
            .stdin
            .take()
            .map(|stdin| Box::new(stdin) as ShardInput);

        let shard = ShardProcess {
            name: name.to_string(),
            pid: child.id(),
            running: Mutex::new(true),
            child: tokio::sync::Mutex::new(child),
            pumps: Mutex::new(pumps),
            out,
        };
        Ok(Launched {
            shard: Arc::new(shard),
            stdin,
        })
    }
}

/// A spawned shard process.
pub struct ShardProcess {
    name: String,
    /// Pid recorded at spawn time.
    pid: Option<u32>,
    /// Cleared once `wait` observed the exit; guards `interrupt`.
    running: Mutex<bool>,
    child: tokio::sync::Mutex<Child>,
    pumps: Mutex<Vec<JoinHandle<std::io::Result<u64>>>>,
    out: Arc<ShardOutput>,
}

impl ShardProcess {
    async fn drain_output(&self) {
        let pumps: Vec<_> = {
            let mut guard = self.pumps.lock().unwrap_or_else(|p| p.into_inner());
            guard.drain(..).collect()
        };
        for mut pump in pumps {
            if tokio::time::timeout(OUTPUT_DRAIN, &mut pump).await.is_err() {
                pump.abort();
            }
        }
        let _ = self.out.finish();
    }
}

#[async_trait]
impl Shard for ShardProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn interrupt(&self) -> Result<(), ProcessError> {
        let running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        if !*running {
            return Err(ProcessError::NotRunning {
                shard: self.name.clone(),
            });
        }
        let pid = self.pid.ok_or_else(|| ProcessError::MissingPid {
            shard: self.name.clone(),
        })?;
        sys::interrupt(pid).map_err(|e| ProcessError::Interrupt {
            shard: self.name.clone(),
            reason: e.to_string(),
        })
    }

    async fn wait(&self) -> ExitOutcome {
        let mut child = self.child.lock().await;
        // The reap and the `running` flag change under one lock, so
        // `interrupt` never signals a pid the OS may already have recycled.
        let res = poll_fn(|cx| {
            let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
            let status = ready!(pin!(child.wait()).poll(cx));
            *running = false;
            Poll::Ready(status)
        })
        .await;
        drop(child);
        self.drain_output().await;

        match res {
            Ok(status) => ExitOutcome::from(status),
            Err(e) => ExitOutcome::WaitFailed(e.to_string()),
        }
    }
}
