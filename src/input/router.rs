//! # Input router: operator keyboard input to the selected shard.
//!
//! Reads operator input line by line and either switches the forwarding
//! target or forwards the line verbatim to the selected shard's stdin:
//!
//! ```text
//! ":Caves\n"   ─► select "Caves" (nothing forwarded)
//! ":Nope\n"    ─► InputUnknownShard, selection unchanged
//! "c_save()\n" ─► write "c_save()\n" to the selected shard's stdin
//!                 (dropped with InputDropped while nothing is selected)
//! ```
//!
//! ## Rules
//! - Every line must end in `\n`; end of input, an unterminated line or a read
//!   error stops the router for good (`InputClosed`). Shards keep running.
//! - A failed write to a shard is reported (`InputForwardFailed`); routing goes on.
//! - The selection is private to the router task.

use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};

use crate::events::{Bus, Event, EventKind};
use crate::process::ShardInput;

/// Routes operator input lines to shard stdin pipes.
pub struct InputRouter<R> {
    reader: R,
    targets: HashMap<String, ShardInput>,
    selector: char,
    selected: Option<String>,
    bus: Bus,
}

impl<R> InputRouter<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Creates a router over `reader` with one stdin pipe per shard name.
    pub fn new(
        reader: R,
        targets: HashMap<String, ShardInput>,
        selector: char,
        bus: Bus,
    ) -> Self {
        Self {
            reader,
            targets,
            selector,
            selected: None,
            bus,
        }
    }

    /// Currently selected shard.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Routes lines until the input ends or fails.
    ///
    /// Returns the stdin pipes so the caller decides when they are closed.
    pub async fn run(mut self) -> HashMap<String, ShardInput> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let reason = match self.reader.read_until(b'\n', &mut line).await {
                Ok(0) => "end of input".to_string(),
                Ok(_) if line.last() != Some(&b'\n') => "unterminated input line".to_string(),
                Ok(_) => {
                    self.route(&line).await;
                    continue;
                }
                Err(e) => e.to_string(),
            };
            self.bus
                .publish(Event::new(EventKind::InputClosed).with_reason(reason));
            return self.targets;
        }
    }

    /// Handles one complete line (including its `\n`).
    async fn route(&mut self, line: &[u8]) {
        if let Some(name) = self.selection(line) {
            self.select(name);
            return;
        }

        let Some(name) = self.selected.as_deref() else {
            self.bus.publish(
                Event::new(EventKind::InputDropped)
                    .with_reason(format!("type {}<shard> to select one", self.selector)),
            );
            return;
        };
        let Some(stdin) = self.targets.get_mut(name) else {
            return;
        };

        let res = match stdin.write_all(line).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = res {
            self.bus.publish(
                Event::new(EventKind::InputForwardFailed)
                    .with_shard(name)
                    .with_reason(e.to_string()),
            );
        }
    }

    /// Shard name of a selector line, `None` for lines to forward.
    fn selection(&self, line: &[u8]) -> Option<String> {
        let mut sel = [0u8; 4];
        let sel = self.selector.encode_utf8(&mut sel).as_bytes();
        let rest = line.strip_prefix(sel)?;
        let name = String::from_utf8_lossy(rest);
        Some(name.trim_end_matches(['\n', '\r']).to_string())
    }

    fn select(&mut self, name: String) {
        if self.targets.contains_key(&name) {
            self.bus
                .publish(Event::new(EventKind::InputSelected).with_shard(name.as_str()));
            self.selected = Some(name);
        } else {
            self.bus
                .publish(Event::new(EventKind::InputUnknownShard).with_shard(name));
        }
    }
}
