// src/exec/runner.rs

//! Spawning one child process and waiting on it.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::StopSpec;
use crate::errors::{RekindleError, Result};
use crate::exec::backend::StartRequest;
use crate::exec::child::{RunId, RunState};
use crate::exec::target::TargetSpec;
use crate::input::ControlEvent;
use crate::types::StopSignal;

/// Ordered, comma-separated names of the loaded preload modules.
pub const ENV_PRELOAD: &str = "REKINDLE_PRELOAD";
/// `partial` or `full`; unset on the first start.
pub const ENV_RELOAD: &str = "REKINDLE_RELOAD";

/// Build the command for one child.
///
/// stdin is `/dev/null` (the keyboard belongs to the supervisor); stdout and
/// stderr are inherited so output appears live and verbatim.
pub fn build_command(target: &TargetSpec, request: &StartRequest) -> Command {
    let line = target.command_line();
    let mut cmd = Command::new(&line[0]);
    cmd.args(&line[1..])
        .env(ENV_PRELOAD, request.preload.join(","))
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    match request.reload {
        Some(kind) => {
            cmd.env(ENV_RELOAD, kind.to_string());
        }
        None => {
            cmd.env_remove(ENV_RELOAD);
        }
    }

    cmd
}

pub(crate) fn spawn_child(target: &TargetSpec, request: &StartRequest) -> Result<Child> {
    debug!(run_id = request.run_id, cmd = %target.display(), "spawning child");
    build_command(target, request).spawn().map_err(|e| {
        RekindleError::TargetError(format!("failed to start '{}': {e}", target.display()))
    })
}

/// Wait for `child` to exit, or stop it when `stop_rx` fires.
///
/// - A natural exit is reported to the control loop as
///   [`ControlEvent::ChildExited`].
/// - A stop request (or the backend dropping the stop sender) stops the
///   child and reports **nothing**; the caller learns the outcome from the
///   returned state instead. This keeps exits of replaced runs out of the
///   control loop.
pub(crate) async fn watch_child(
    mut child: Child,
    run_id: RunId,
    stop: StopSpec,
    events: mpsc::Sender<ControlEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<RunState> {
    tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("waiting for child of run {run_id}"))?;
            let code = exit_code(status);

            info!(run_id, exit_code = code, "child exited on its own");

            if events.send(ControlEvent::ChildExited { run_id, code }).await.is_err() {
                debug!(run_id, "control loop gone; exit not reported");
            }
            Ok(RunState::Exited(code))
        }

        request = &mut stop_rx => {
            if request.is_err() {
                debug!(run_id, "stop channel closed without request; stopping child");
            }
            stop_child(&mut child, run_id, stop).await
        }
    }
}

/// Interrupt, wait up to the grace period, then kill.
async fn stop_child(child: &mut Child, run_id: RunId, stop: StopSpec) -> Result<RunState> {
    // `id()` is `None` once the child has been reaped.
    let Some(raw_pid) = child.id() else {
        return Ok(RunState::Killed);
    };

    let signal = match stop.signal {
        StopSignal::Int => Signal::SIGINT,
        StopSignal::Term => Signal::SIGTERM,
    };

    match i32::try_from(raw_pid) {
        Ok(pid) => match kill(Pid::from_raw(pid), signal) {
            Ok(()) => debug!(run_id, pid, ?signal, "stop signal sent"),
            Err(Errno::ESRCH) => debug!(run_id, pid, "child already gone"),
            Err(e) => warn!(run_id, pid, error = %e, "sending stop signal failed"),
        },
        Err(_) => warn!(run_id, raw_pid, "pid out of range; skipping stop signal"),
    }

    match tokio::time::timeout(stop.grace_period, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(run_id, exit_code = exit_code(status), "child stopped");
            Ok(RunState::Killed)
        }
        Ok(Err(e)) => Err(RekindleError::ShutdownError(format!(
            "waiting for child of run {run_id} to stop: {e}"
        ))),
        Err(_elapsed) => {
            warn!(
                run_id,
                grace_period = ?stop.grace_period,
                "child ignored stop signal; killing"
            );
            child.kill().await.map_err(|e| {
                RekindleError::ShutdownError(format!("killing child of run {run_id}: {e}"))
            })?;
            Ok(RunState::Killed)
        }
    }
}

/// Exit code, or `128 + signal` when the child was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => status.signal().map(|s| 128 + s).unwrap_or(-1),
    }
}
