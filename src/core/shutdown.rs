//! # Cross-platform OS signal handling.
//!
//! Provides [`ShutdownSignals`], a set of termination-signal listeners that stay
//! installed for the life of the process, and [`spawn_listener`], which turns
//! every received signal into one operator termination request.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Once installed, the listeners replace the default "terminate" action: every
//! later signal is delivered as a request, never as an immediate exit.

use std::io;

use tokio::sync::mpsc;

use crate::events::{Bus, Event, EventKind};

/// Persistent termination-signal listeners.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Installs the listeners. Must be called from within a tokio runtime.
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Waits for the next termination signal.
    pub async fn recv(&mut self) -> io::Result<()> {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
        Ok(())
    }
}

/// Persistent termination-signal listeners.
#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    /// Installs the listeners. Must be called from within a tokio runtime.
    pub fn new() -> io::Result<Self> {
        Ok(Self)
    }

    /// Waits for the next termination signal.
    pub async fn recv(&mut self) -> io::Result<()> {
        tokio::signal::ctrl_c().await
    }
}

/// Installs the signal listeners now and forwards every signal as one request.
///
/// If the listeners cannot be installed (or fail later), a `SignalUnavailable`
/// event is published and the returned receiver is closed.
pub fn spawn_listener(bus: Bus) -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);

    let mut signals = match ShutdownSignals::new() {
        Ok(signals) => signals,
        Err(e) => {
            bus.publish(Event::new(EventKind::SignalUnavailable).with_reason(e.to_string()));
            return rx;
        }
    };

    tokio::spawn(async move {
        loop {
            if let Err(e) = signals.recv().await {
                bus.publish(Event::new(EventKind::SignalUnavailable).with_reason(e.to_string()));
                return;
            }
            if tx.send(()).await.is_err() {
                return;
            }
        }
    });
    rx
}

/// Waits for the next request; never completes once the channel is closed.
pub(crate) async fn next_request(requests: &mut mpsc::Receiver<()>) {
    if requests.recv().await.is_none() {
        std::future::pending::<()>().await;
    }
}
