// src/input/mod.rs

//! Input multiplexing for the control loop.
//!
//! Independent producers push typed [`ControlEvent`]s into one bounded
//! queue; the control loop is the only consumer:
//! - [`keyboard`]: a dedicated OS thread reading single keystrokes;
//! - [`poller`]: a Tokio task polling the file snapshot tracker;
//! - [`signals`]: SIGINT / SIGTERM listeners;
//! - the executor's child waiters (`ChildExited`).
//!
//! Producers block when the queue is full, so nothing is dropped and no
//! producer can starve the others.

pub mod keyboard;
pub mod keys;
pub mod poller;
pub mod signals;

use std::collections::BTreeSet;
use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::exec::RunId;

pub use keyboard::spawn_keyboard_reader;
pub use keys::{decode_key, KeyCommand};
pub use poller::spawn_poller;
pub use signals::spawn_signal_listener;

/// Capacity of the control queue.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Why the supervisor is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

/// One discrete input for the control loop. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    KeyPress(char),
    /// Ordinary watched files changed.
    FilesChanged(BTreeSet<PathBuf>),
    /// Files backing preloaded modules changed.
    PreloadChanged {
        modules: BTreeSet<String>,
        paths: BTreeSet<PathBuf>,
    },
    /// A poll completed without changes.
    Tick,
    /// A child exited on its own (never sent for runs the supervisor
    /// stopped).
    ChildExited { run_id: RunId, code: i32 },
    Shutdown(ShutdownReason),
}

/// Merges all producers into a single ordered stream.
#[derive(Debug)]
pub struct InputMultiplexer {
    tx: mpsc::Sender<ControlEvent>,
    rx: mpsc::Receiver<ControlEvent>,
}

impl InputMultiplexer {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx }
    }

    /// Handle for a new producer.
    pub fn sender(&self) -> mpsc::Sender<ControlEvent> {
        self.tx.clone()
    }

    /// Wait for the next event.
    ///
    /// Never returns `None` while the multiplexer is alive, since it keeps a
    /// sender of its own.
    pub async fn next_event(&mut self) -> Option<ControlEvent> {
        self.rx.recv().await
    }

    /// Everything already queued, without waiting.
    pub fn drain_pending(&mut self) -> Vec<ControlEvent> {
        let mut pending = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            pending.push(event);
        }
        pending
    }

    /// Next event plus everything queued behind it: one debounce batch.
    pub async fn next_batch(&mut self) -> Option<Vec<ControlEvent>> {
        let first = self.next_event().await?;
        let mut batch = vec![first];
        batch.extend(self.drain_pending());
        Some(batch)
    }
}

impl Default for InputMultiplexer {
    fn default() -> Self {
        Self::new(EVENT_QUEUE_CAPACITY)
    }
}
