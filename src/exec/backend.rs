// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The control loop talks to an `ExecutorBackend` instead of spawning
//! processes itself, so tests can swap in a fake that records starts and
//! terminations without touching the OS.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::StopSpec;
use crate::errors::{RekindleError, Result};
use crate::exec::child::{ChildRun, RunId, RunState};
use crate::exec::runner::{spawn_child, watch_child};
use crate::exec::target::TargetSpec;
use crate::input::ControlEvent;
use crate::types::{ClearMode, ReloadKind};

/// Everything needed to start one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub run_id: RunId,
    /// Loaded preload modules, in preload order.
    pub preload: Vec<String>,
    /// `None` for the very first start.
    pub reload: Option<ReloadKind>,
    /// Clear applied right before the child starts.
    pub clear: ClearMode,
}

/// Trait abstracting how the supervised program is run.
///
/// Production code uses [`RealExecutorBackend`]; tests provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Start a fresh child. At most one child is live at a time; the caller
    /// terminates the previous one first.
    fn start(
        &mut self,
        request: StartRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChildRun>> + Send + '_>>;

    /// Stop `run` (interrupt, grace period, then kill) and wait until it is
    /// gone. Must be a no-op for runs that are not running.
    fn terminate<'a>(
        &'a mut self,
        run: &'a mut ChildRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// The live child owned by [`RealExecutorBackend`].
struct ActiveChild {
    run_id: RunId,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<RunState>>,
}

/// Real executor backend used in production.
///
/// Each child gets a waiter task (see [`watch_child`]) that either reports a
/// natural exit as [`ControlEvent::ChildExited`] or, when asked through its
/// stop channel, stops the child and reports nothing.
pub struct RealExecutorBackend {
    target: TargetSpec,
    stop: StopSpec,
    events: mpsc::Sender<ControlEvent>,
    active: Option<ActiveChild>,
}

impl std::fmt::Debug for RealExecutorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealExecutorBackend")
            .field("target", &self.target)
            .field("stop", &self.stop)
            .field("active_run", &self.active.as_ref().map(|a| a.run_id))
            .finish()
    }
}

impl RealExecutorBackend {
    pub fn new(target: TargetSpec, stop: StopSpec, events: mpsc::Sender<ControlEvent>) -> Self {
        Self {
            target,
            stop,
            events,
            active: None,
        }
    }

    async fn start_inner(&mut self, request: StartRequest) -> Result<ChildRun> {
        if let Some(previous) = self.active.take() {
            if !previous.handle.is_finished() {
                warn!(
                    run_id = previous.run_id,
                    "starting a new child while the previous one is live; stopping it"
                );
                stop_active(previous).await?;
            }
        }

        crate::terminal::clear(request.clear);

        let child = spawn_child(&self.target, &request)?;
        let pid = child.id();
        let run = ChildRun::new(request.run_id, pid);

        info!(run_id = run.run_id, ?pid, reload = ?request.reload, "child started");

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(watch_child(
            child,
            request.run_id,
            self.stop,
            self.events.clone(),
            stop_rx,
        ));

        self.active = Some(ActiveChild {
            run_id: request.run_id,
            stop: Some(stop_tx),
            handle,
        });

        Ok(run)
    }

    async fn terminate_inner(&mut self, run: &mut ChildRun) -> Result<()> {
        if !run.is_running() {
            debug!(run_id = run.run_id, state = ?run.state, "terminate on stopped run; nothing to do");
            return Ok(());
        }

        let active = match self.active.take() {
            Some(active) if active.run_id == run.run_id => active,
            other => {
                // The waiter for this run is already gone.
                self.active = other;
                run.state = RunState::Killed;
                return Ok(());
            }
        };

        run.state = stop_active(active).await?;
        debug!(run_id = run.run_id, state = ?run.state, "child terminated");
        Ok(())
    }
}

/// Ask a waiter to stop its child and wait for the outcome.
async fn stop_active(mut active: ActiveChild) -> Result<RunState> {
    if let Some(stop) = active.stop.take() {
        if stop.send(()).is_err() {
            debug!(run_id = active.run_id, "child already finished while stopping");
        }
    }

    match active.handle.await {
        Ok(state) => state,
        Err(e) => Err(RekindleError::ShutdownError(format!(
            "waiter for run {} failed: {e}",
            active.run_id
        ))),
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn start(
        &mut self,
        request: StartRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChildRun>> + Send + '_>> {
        Box::pin(self.start_inner(request))
    }

    fn terminate<'a>(
        &'a mut self,
        run: &'a mut ChildRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.terminate_inner(run))
    }
}
