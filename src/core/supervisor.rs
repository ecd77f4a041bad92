//! # Supervisor: starts the shard set, monitors it, and drives cascading shutdown.
//!
//! The [`Supervisor`] owns the event bus and the subscribers. For every run it
//! spawns one monitor per shard, optionally an input router, and an event
//! listener that fans events out to the subscribers.
//!
//! ## State machine
//! ```text
//! Starting ──(all spawned)──────────────────────────► Running
//!    │                                                   │
//!    ├─ first spawn fails ──► Err(RuntimeError::Spawn)   ├─ shard exits ─────────► Terminating (cascade)
//!    └─ later spawn fails ──► Terminating, code = 1      └─ operator request ────► Terminating
//!
//! Terminating: latch fired ─► every monitor interrupts its shard once
//!    ├─ all monitors done      ─► Done (aggregate exit code)
//!    └─ second operator request ─► Done without waiting (ForcedExit)
//! ```
//!
//! ## Event flow
//! ```text
//! monitors / router / supervisor ── publish ──► Bus ──► listener ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ## Rules
//! - Shards are spawned strictly in [`ShardSet`] order.
//! - The latch fires at most once; `ShutdownRequested` and `CascadeTriggered`
//!   are only published by whoever fired it.
//! - No timeouts: a hung shard is only abandoned on a second operator request.
//! - Pending events are delivered to subscribers before `run` returns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncBufRead;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cluster::ShardSet;
use crate::core::config::Config;
use crate::core::latch::ShutdownLatch;
use crate::core::monitor::{self, RunState};
use crate::core::shutdown::{self, next_request};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::input::InputRouter;
use crate::process::{Launch, Launched, ShardInput};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Coordinates shard monitors, event delivery and graceful shutdown.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    /// Receiver for the next run; events published before `run_with`
    /// (e.g. by the signal listener) queue up here.
    pending: Mutex<Option<broadcast::Receiver<Event>>>,
}

impl Supervisor {
    /// Creates a new supervisor with the given config and subscribers.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let pending = Mutex::new(Some(bus.subscribe()));
        Self {
            cfg,
            bus,
            subscribers,
            pending,
        }
    }

    /// Event bus of this supervisor.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Installs OS termination-signal listeners feeding a request channel.
    ///
    /// Call this as early as possible: until it runs, a Ctrl-C still
    /// terminates the supervisor immediately.
    pub fn signal_requests(&self) -> mpsc::Receiver<()> {
        shutdown::spawn_listener(self.bus.clone())
    }

    /// Runs `shards` with OS signals as termination requests and no stdin routing.
    pub async fn run<L>(&self, launcher: &L, shards: &ShardSet) -> Result<i32, RuntimeError>
    where
        L: Launch + ?Sized,
    {
        let requests = self.signal_requests();
        self.run_with(launcher, shards, None::<&'static [u8]>, requests)
            .await
    }

    /// Runs `shards` until every shard stopped or a second termination request arrived.
    ///
    /// - `input`: operator input routed to the selected shard's stdin, if any.
    /// - `requests`: operator termination requests; a closed channel means "none".
    ///
    /// Returns the aggregate exit code. Fails only when the first shard cannot
    /// be spawned.
    pub async fn run_with<L, R>(
        &self,
        launcher: &L,
        shards: &ShardSet,
        input: Option<R>,
        mut requests: mpsc::Receiver<()>,
    ) -> Result<i32, RuntimeError>
    where
        L: Launch + ?Sized,
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let listener = self.event_listener();
        let res = self.supervise(launcher, shards, input, &mut requests).await;
        listener.stop().await;
        *self.pending.lock().unwrap_or_else(|p| p.into_inner()) = Some(self.bus.subscribe());
        res
    }

    async fn supervise<L, R>(
        &self,
        launcher: &L,
        shards: &ShardSet,
        input: Option<R>,
        requests: &mut mpsc::Receiver<()>,
    ) -> Result<i32, RuntimeError>
    where
        L: Launch + ?Sized,
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let latch = ShutdownLatch::new();
        let state = Arc::new(RunState::default());
        let mut monitors = JoinSet::new();

        self.bus.publish(
            Event::new(EventKind::ClusterStarting)
                .with_count(shards.len())
                .with_reason(shards.names().join(", ")),
        );
        let targets = self.start_shards(launcher, shards, &latch, &state, &mut monitors)?;

        // Unrouted stdin pipes stay open until the run ends.
        let (router, _idle) = match input {
            Some(reader) => (Some(self.spawn_router(reader, targets)), HashMap::new()),
            None => (None, targets),
        };

        tokio::select! {
            _ = latch.fired() => {}
            _ = next_request(requests) => {
                if latch.trigger() {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested));
                }
            }
        }

        let remaining = state.running();
        if remaining > 0 {
            self.bus
                .publish(Event::new(EventKind::WaitingForShards).with_count(remaining));
        }

        tokio::select! {
            _ = async { while monitors.join_next().await.is_some() {} } => {
                self.bus.publish(
                    Event::new(EventKind::AllStopped).with_code(state.exit_code()),
                );
            }
            _ = next_request(requests) => {
                self.bus
                    .publish(Event::new(EventKind::ForcedExit).with_count(state.running()));
                monitors.detach_all();
            }
        }

        if let Some(router) = router {
            router.abort();
        }
        Ok(state.exit_code())
    }

    /// Spawns shards in order, one monitor each; returns their stdin pipes.
    fn start_shards<L>(
        &self,
        launcher: &L,
        shards: &ShardSet,
        latch: &ShutdownLatch,
        state: &Arc<RunState>,
        monitors: &mut JoinSet<()>,
    ) -> Result<HashMap<String, ShardInput>, RuntimeError>
    where
        L: Launch + ?Sized,
    {
        let mut targets = HashMap::with_capacity(shards.len());
        let names = shards.names();

        for (i, name) in names.iter().enumerate() {
            if latch.is_fired() {
                self.skip_shards(&names[i..]);
                break;
            }
            match launcher.launch(name, &shards.label(name)) {
                Ok(Launched { shard, stdin }) => {
                    self.bus
                        .publish(Event::new(EventKind::ShardStarted).with_shard(name.as_str()));
                    if let Some(stdin) = stdin {
                        targets.insert(name.clone(), stdin);
                    }
                    state.started();
                    monitors.spawn(monitor::watch(
                        shard,
                        latch.clone(),
                        Arc::clone(state),
                        self.bus.clone(),
                    ));
                }
                Err(e) => {
                    self.bus.publish(
                        Event::new(EventKind::ShardSpawnFailed)
                            .with_shard(e.shard())
                            .with_reason(e.to_string()),
                    );
                    if monitors.is_empty() {
                        return Err(RuntimeError::Spawn(e));
                    }
                    state.record(1);
                    if latch.trigger() {
                        self.bus.publish(
                            Event::new(EventKind::CascadeTriggered).with_shard(name.as_str()),
                        );
                    }
                    self.skip_shards(&names[i + 1..]);
                    break;
                }
            }
        }
        Ok(targets)
    }

    fn skip_shards(&self, names: &[String]) {
        for name in names {
            self.bus.publish(
                Event::new(EventKind::ShardNotStarted)
                    .with_shard(name.as_str())
                    .with_reason("shutdown in progress"),
            );
        }
    }

    fn spawn_router<R>(
        &self,
        reader: R,
        targets: HashMap<String, ShardInput>,
    ) -> JoinHandle<HashMap<String, ShardInput>>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let router = InputRouter::new(reader, targets, self.cfg.selector, self.bus.clone());
        tokio::spawn(router.run())
    }

    /// Forwards bus events to a fresh subscriber set, starting with those
    /// already queued on the pending receiver.
    fn event_listener(&self) -> EventListener {
        let early = self
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        let mut rx = early.unwrap_or_else(|| self.bus.subscribe());
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        let done = CancellationToken::new();
        let stop = done.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;

            // Subscriber queues are closed now; reports raised while they
            // drained can only go to the log.
            loop {
                match rx.try_recv() {
                    Ok(ev) if ev.is_subscriber_report() => warn!(
                        subscriber = ev.shard.as_deref().unwrap_or("-"),
                        reason = ev.reason.as_deref().unwrap_or(""),
                        "subscriber report after shutdown: {:?}",
                        ev.kind
                    ),
                    Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        });
        EventListener { stop, join }
    }
}

/// Handle to the per-run event listener task.
struct EventListener {
    stop: CancellationToken,
    join: JoinHandle<()>,
}

impl EventListener {
    /// Delivers every event published so far, then shuts the subscribers down.
    async fn stop(self) {
        self.stop.cancel();
        let _ = self.join.await;
    }
}
