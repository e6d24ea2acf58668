use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rekindle::errors::{RekindleError, Result};
use rekindle::exec::{ChildRun, ExecutorBackend, RunId, RunState, StartRequest};
use rekindle::types::ReloadKind;

/// One call observed by [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Start(StartRequest),
    /// Only recorded for runs that were still running.
    Terminate(RunId),
}

/// Shared view of everything a [`FakeExecutor`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct FakeLog {
    calls: Arc<Mutex<Vec<FakeCall>>>,
}

impl FakeLog {
    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<StartRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Start(req) => Some(req),
                FakeCall::Terminate(_) => None,
            })
            .collect()
    }

    /// Reload kinds of every start after the first.
    pub fn reloads(&self) -> Vec<ReloadKind> {
        self.starts().into_iter().filter_map(|s| s.reload).collect()
    }

    pub fn terminations(&self) -> Vec<RunId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Terminate(id) => Some(id),
                FakeCall::Start(_) => None,
            })
            .collect()
    }

    fn push(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A fake executor that:
/// - records which children were "started" and "terminated"
/// - never spawns a process; children stay running until terminated, or
///   until the test reports an exit through the control queue.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    log: FakeLog,
    /// Starts from this run id on fail with a target error.
    fail_from: Option<RunId>,
    /// Starts from this run id on take this long before the child is up.
    slow_from: Option<(RunId, Duration)>,
}

impl FakeExecutor {
    pub fn new() -> (Self, FakeLog) {
        let log = FakeLog::default();
        (
            Self {
                log: log.clone(),
                fail_from: None,
                slow_from: None,
            },
            log,
        )
    }

    /// Make every start with `run_id >= from` fail.
    pub fn failing_from(mut self, from: RunId) -> Self {
        self.fail_from = Some(from);
        self
    }

    /// Make every start with `run_id >= from` take `delay`, so events can
    /// arrive while a reload is still in progress.
    pub fn slow_from(mut self, from: RunId, delay: Duration) -> Self {
        self.slow_from = Some((from, delay));
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn start(
        &mut self,
        request: StartRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChildRun>> + Send + '_>> {
        Box::pin(async move {
            let run_id = request.run_id;
            if let Some((from, delay)) = self.slow_from {
                if run_id >= from {
                    tokio::time::sleep(delay).await;
                }
            }
            if self.fail_from.is_some_and(|from| run_id >= from) {
                return Err(RekindleError::TargetError(format!(
                    "fake start failure for run {run_id}"
                )));
            }
            self.log.push(FakeCall::Start(request));
            Ok(ChildRun::new(run_id, None))
        })
    }

    fn terminate<'a>(
        &'a mut self,
        run: &'a mut ChildRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if run.is_running() {
                self.log.push(FakeCall::Terminate(run.run_id));
                run.state = RunState::Killed;
            }
            Ok(())
        })
    }
}
