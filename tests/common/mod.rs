//! Shared fakes for supervisor integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{DuplexStream, duplex};
use tokio::sync::watch;

use shardvisor::{
    Event, EventKind, ExitOutcome, Launch, Launched, ProcessError, Shard, ShardInput, Subscribe,
};

/// In-memory shard whose exit is driven by the test.
pub struct FakeShard {
    name: String,
    exit: watch::Sender<Option<ExitOutcome>>,
    exited: AtomicBool,
    interrupts: AtomicUsize,
    /// Outcome to exit with when interrupted; `None` ignores interrupts.
    on_interrupt: Option<ExitOutcome>,
    refusal: Refusal,
    stdin: Mutex<Option<DuplexStream>>,
}

#[async_trait]
impl Shard for FakeShard {
    fn name(&self) -> &str {
        &self.name
    }

    fn interrupt(&self) -> Result<(), ProcessError> {
        if self.exited.load(Ordering::SeqCst) {
            return Err(ProcessError::NotRunning {
                shard: self.name.clone(),
            });
        }
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        match self.refusal {
            Refusal::None => {}
            Refusal::Fail => {
                return Err(ProcessError::Interrupt {
                    shard: self.name.clone(),
                    reason: "no such process".into(),
                });
            }
            Refusal::NotRunning => {
                return Err(ProcessError::NotRunning {
                    shard: self.name.clone(),
                });
            }
        }
        if let Some(outcome) = &self.on_interrupt {
            self.exit.send_replace(Some(outcome.clone()));
        }
        Ok(())
    }

    async fn wait(&self) -> ExitOutcome {
        let mut rx = self.exit.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(v) => (*v).clone(),
            Err(_) => None,
        };
        self.exited.store(true, Ordering::SeqCst);
        outcome.unwrap_or_else(|| ExitOutcome::WaitFailed("exit channel closed".into()))
    }
}

/// Test-side handle to a [`FakeShard`].
#[derive(Clone)]
pub struct ShardHandle(Arc<FakeShard>);

impl ShardHandle {
    pub fn exit(&self, outcome: ExitOutcome) {
        self.0.exit.send_replace(Some(outcome));
    }

    pub fn interrupts(&self) -> usize {
        self.0.interrupts.load(Ordering::SeqCst)
    }

    /// Read half of the shard's stdin pipe.
    pub fn take_stdin(&self) -> DuplexStream {
        self.0
            .stdin
            .lock()
            .unwrap()
            .take()
            .expect("stdin already taken")
    }
}

/// How a fake shard answers interrupts.
#[derive(Clone, Copy)]
enum Refusal {
    None,
    Fail,
    NotRunning,
}

enum Plan {
    Run(Arc<FakeShard>, DuplexStream),
    Fail,
}

/// [`Launch`] implementation backed by [`FakeShard`]s.
#[derive(Default)]
pub struct FakeLauncher {
    plans: Mutex<HashMap<String, Plan>>,
    launched: Mutex<Vec<(String, String)>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shard that exits with `on_interrupt` when interrupted.
    pub fn shard(&self, name: &str, on_interrupt: Option<ExitOutcome>) -> ShardHandle {
        self.add(name, on_interrupt, Refusal::None)
    }

    /// Registers a shard whose interrupts always fail.
    pub fn stubborn(&self, name: &str) -> ShardHandle {
        self.add(name, None, Refusal::Fail)
    }

    /// Registers a shard that reports `NotRunning` to interrupts, as one
    /// whose exit is being reaped does.
    pub fn exiting(&self, name: &str) -> ShardHandle {
        self.add(name, None, Refusal::NotRunning)
    }

    /// Registers a shard that cannot be spawned.
    pub fn failing(&self, name: &str) {
        self.plans.lock().unwrap().insert(name.to_string(), Plan::Fail);
    }

    /// `(name, label)` of every launched shard, in launch order.
    pub fn launched(&self) -> Vec<(String, String)> {
        self.launched.lock().unwrap().clone()
    }

    fn add(&self, name: &str, on_interrupt: Option<ExitOutcome>, refusal: Refusal) -> ShardHandle {
        let (tx, rx) = duplex(1024);
        let shard = Arc::new(FakeShard {
            name: name.to_string(),
            exit: watch::Sender::new(None),
            exited: AtomicBool::new(false),
            interrupts: AtomicUsize::new(0),
            on_interrupt,
            refusal,
            stdin: Mutex::new(Some(rx)),
        });
        self.plans
            .lock()
            .unwrap()
            .insert(name.to_string(), Plan::Run(Arc::clone(&shard), tx));
        ShardHandle(shard)
    }
}

impl Launch for FakeLauncher {
    fn launch(&self, name: &str, label: &str) -> Result<Launched, ProcessError> {
        let plan = self.plans.lock().unwrap().remove(name);
        match plan {
            Some(Plan::Run(shard, stdin)) => {
                self.launched
                    .lock()
                    .unwrap()
                    .push((name.to_string(), label.to_string()));
                Ok(Launched {
                    shard,
                    stdin: Some(Box::new(stdin) as ShardInput),
                })
            }
            Some(Plan::Fail) | None => Err(ProcessError::Spawn {
                shard: name.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            }),
        }
    }
}

/// Subscriber that keeps every event it sees.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    /// First event of `kind`, if any.
    pub fn find(&self, kind: EventKind) -> Option<Event> {
        self.events().into_iter().find(|e| e.kind == kind)
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Polls `cond` until it holds; panics after 5 seconds.
pub async fn until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
