// src/input/poller.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::ControlEvent;
use crate::preload::PreloadIndex;
use crate::watch::SnapshotTracker;

/// Handle for the file poller.
///
/// Dropping it stops polling.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl std::fmt::Debug for PollerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that polls `tracker` every `spec.interval` and reports
/// changes to the control loop.
///
/// - `index` tells the poller which paths back preloaded modules. The control
///   loop publishes a fresh index after each (re)load; those paths are
///   tracked even if they do not match the watch globs.
/// - Changes to preload paths become [`ControlEvent::PreloadChanged`], all
///   others [`ControlEvent::FilesChanged`]. A poll without changes sends
///   [`ControlEvent::Tick`].
/// - A failed scan is logged and skipped; the next tick retries.
///
/// Scans run on the blocking pool so a large tree never stalls the runtime.
pub fn spawn_poller(
    tracker: SnapshotTracker,
    index: watch::Receiver<Arc<PreloadIndex>>,
    tx: mpsc::Sender<ControlEvent>,
) -> PollerHandle {
    let period = tracker.spec().interval;
    info!(interval = ?period, patterns = ?tracker.spec().patterns, "file poller started");

    let task = tokio::spawn(async move {
        let mut tracker = tracker;

        let extra = current_extra(&index);
        tracker = match tokio::task::spawn_blocking(move || {
            tracker.prime(&extra);
            tracker
        })
        .await
        {
            Ok(tracker) => tracker,
            Err(e) => {
                error!(error = %e, "initial scan task failed; file polling stopped");
                return;
            }
        };

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the baseline is already taken.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let index = index.borrow().clone();
            let extra = index.paths();

            let (returned, result) = match tokio::task::spawn_blocking(move || {
                let result = tracker.poll(&extra);
                (tracker, result)
            })
            .await
            {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "scan task failed; file polling stopped");
                    return;
                }
            };
            tracker = returned;

            let changed = match result {
                Ok(changed) => changed,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "file scan failed; retrying next poll");
                    continue;
                }
            };

            if !dispatch(&index, changed, &tx).await {
                debug!("control loop gone; poller stopping");
                return;
            }
        }
    });

    PollerHandle { task }
}

fn current_extra(index: &watch::Receiver<Arc<PreloadIndex>>) -> BTreeSet<PathBuf> {
    index.borrow().paths()
}

/// Send the events for one poll. Returns false once the receiver is gone.
async fn dispatch(
    index: &PreloadIndex,
    changed: BTreeSet<PathBuf>,
    tx: &mpsc::Sender<ControlEvent>,
) -> bool {
    if changed.is_empty() {
        return tx.send(ControlEvent::Tick).await.is_ok();
    }

    let split = index.split(changed);

    if !split.ordinary.is_empty() {
        debug!(paths = ?split.ordinary, "watched files changed");
        if tx.send(ControlEvent::FilesChanged(split.ordinary)).await.is_err() {
            return false;
        }
    }

    if !split.preload_paths.is_empty() {
        debug!(modules = ?split.modules, paths = ?split.preload_paths, "preload files changed");
        let event = ControlEvent::PreloadChanged {
            modules: split.modules,
            paths: split.preload_paths,
        };
        if tx.send(event).await.is_err() {
            return false;
        }
    }

    true
}
