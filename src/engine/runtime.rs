// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{ChildRun, ExecutorBackend, RunId, StartRequest};
use crate::fs::FileSystem;
use crate::input::InputMultiplexer;
use crate::preload::{PreloadFailure, PreloadIndex};
use crate::status::emit_detail;
use crate::types::{ClearMode, ReloadKind};
use crate::watch::path_utils::display_path;

use super::core::CoreRuntime;
use super::CoreCommand;

/// Drives the reload core in response to batches of `ControlEvent`s, and
/// delegates process handling to an `ExecutorBackend`.
///
/// This is an IO shell around `CoreRuntime`, which contains the reload
/// semantics. This struct handles async IO: reading events, starting and
/// terminating children and printing status lines. Transitions are strictly
/// sequential: the old child is fully stopped before a new one starts, and
/// the next batch is only read after the transition completed.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    input: InputMultiplexer,
    executor: E,
    fs: Arc<dyn FileSystem>,
    index_tx: watch::Sender<Arc<PreloadIndex>>,
    current: Option<ChildRun>,
    next_run_id: RunId,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        input: InputMultiplexer,
        executor: E,
        fs: Arc<dyn FileSystem>,
        index_tx: watch::Sender<Arc<PreloadIndex>>,
    ) -> Self {
        Self {
            core,
            input,
            executor,
            fs,
            index_tx,
            current: None,
            next_run_id: 1,
        }
    }

    /// Main event loop. Returns the process exit code.
    ///
    /// - Loads the preload modules and starts the first child (a failure to
    ///   start it is fatal).
    /// - Feeds each batch of events into the core runtime.
    /// - Executes the commands returned by the core.
    /// - On quit, terminates the current child before returning.
    pub async fn run(mut self) -> Result<i32> {
        info!("rekindle runtime started");

        self.reload_preloads();
        self.start_child(None, ClearMode::None).await?;

        loop {
            let batch = match self.input.next_batch().await {
                Some(batch) => batch,
                None => {
                    info!("control channel closed; exiting");
                    break;
                }
            };

            debug!(events = batch.len(), "runtime received batch");

            let step = self.core.step(batch);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        self.stop_current().await?;

        let code = self.current.as_ref().map_or(0, ChildRun::exit_code);
        info!(exit_code = code, "runtime exiting");
        Ok(code)
    }

    /// The child of the most recent start, if it could be started.
    pub fn current(&self) -> Option<&ChildRun> {
        self.current.as_ref()
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::ChildExited { run_id, code } => self.record_exit(run_id, code),
            CoreCommand::Reload { kind, clear } => {
                self.reload(kind, clear).await?;
                self.core.reload_finished();
            }
            CoreCommand::WarnStale { modules, paths } => {
                debug!(?modules, "stale preloaded modules");
                status!("preloaded files have been modified:");
                for path in paths.iter() {
                    emit_detail(&display_path(path));
                }
                emit_detail("press R for full reload");
            }
            CoreCommand::Shutdown => {
                // The loop exits after this batch and terminates the child.
                debug!("core issued Shutdown command");
            }
        }
        Ok(())
    }

    fn record_exit(&mut self, run_id: RunId, code: i32) {
        match self.current.as_mut() {
            Some(run) if run.run_id == run_id => {
                run.mark_exited(code);
                status!("program exited with code {code}; waiting for changes");
            }
            _ => debug!(run_id, code, "ignoring exit of a replaced run"),
        }
    }

    async fn reload(&mut self, kind: ReloadKind, clear: ClearMode) -> Result<()> {
        info!(%kind, ?clear, "reloading");
        self.stop_current().await?;

        if kind == ReloadKind::Full {
            self.reload_preloads();
        }

        self.start_child(Some(kind), clear).await
    }

    /// (Re)load the registry and publish the new index to the poller.
    fn reload_preloads(&mut self) {
        if self.core.registry().is_empty() {
            return;
        }

        let failures = self.core.load_preloads(self.fs.as_ref());
        report_preload_failures(&failures);

        let index = Arc::new(self.core.preload_index());
        // No receivers only means nobody polls (e.g. in tests).
        self.index_tx.send_replace(index);
    }

    async fn start_child(&mut self, reload: Option<ReloadKind>, clear: ClearMode) -> Result<()> {
        let run_id = self.next_run_id;
        self.next_run_id += 1;

        let request = StartRequest {
            run_id,
            preload: self.core.loaded_modules(),
            reload,
            clear,
        };

        match self.executor.start(request).await {
            Ok(run) => {
                if let Some(kind) = reload {
                    status!("{kind} reload");
                }
                self.current = Some(run);
                Ok(())
            }
            // Without a first child there is nothing to supervise.
            Err(err) if reload.is_none() => Err(err),
            Err(err) => {
                warn!(run_id, error = %err, "child failed to start");
                status!("{err}; waiting for changes");
                self.current = None;
                Ok(())
            }
        }
    }

    async fn stop_current(&mut self) -> Result<()> {
        if let Some(run) = self.current.as_mut() {
            self.executor.terminate(run).await?;
        }
        Ok(())
    }
}

fn report_preload_failures(failures: &[PreloadFailure]) {
    for failure in failures {
        warn!(module = %failure.module, reason = %failure.reason, "preload failed");
        status!("failed to preload {}: {}", failure.module, failure.reason);
    }
}
