// src/exec/child.rs

use std::time::Instant;

/// Identifier of one child lifetime. Strictly increasing per session.
pub type RunId = u64;

/// Termination state of a [`ChildRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Exited on its own with this code (`128 + signal` when killed by a
    /// signal nobody here sent).
    Exited(i32),
    /// Stopped by the supervisor.
    Killed,
}

/// One lifetime of the supervised program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRun {
    pub run_id: RunId,
    /// OS process id; `None` for fakes or when the OS did not report one.
    pub pid: Option<u32>,
    pub started_at: Instant,
    pub state: RunState,
}

impl ChildRun {
    pub fn new(run_id: RunId, pid: Option<u32>) -> Self {
        Self {
            run_id,
            pid,
            started_at: Instant::now(),
            state: RunState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Record a natural exit reported by the waiter. Ignored unless running.
    pub fn mark_exited(&mut self, code: i32) {
        if self.is_running() {
            self.state = RunState::Exited(code);
        }
    }

    /// Exit code to report when the supervisor quits after this run.
    ///
    /// A run the supervisor stopped itself counts as success.
    pub fn exit_code(&self) -> i32 {
        match self.state {
            RunState::Exited(code) => code,
            RunState::Running | RunState::Killed => 0,
        }
    }
}
