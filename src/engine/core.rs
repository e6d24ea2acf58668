// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes batches of [`ControlEvent`]s and produces:
//! - an updated core state (loop state, preload dirty flags)
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events, starting and terminating children, clearing the screen and
//! printing status lines.
//!
//! Apart from [`CoreRuntime::load_preloads`], which resolves module files
//! through the injected [`FileSystem`], the core performs no IO and can be
//! tested without Tokio, channels or processes.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{PreloadSpec, ReloadPolicy};
use crate::engine::event_handlers::{
    handle_files_changed, handle_key, handle_preload_changed, stale_warning, CoreCommand,
    CoreStep,
};
use crate::engine::plan::ReloadPlan;
use crate::fs::FileSystem;
use crate::input::ControlEvent;
use crate::preload::{PreloadFailure, PreloadIndex, PreloadRegistry};
use crate::types::ReloadKind;

/// States of the reload control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// A child has been started (it may have exited since); waiting for
    /// events.
    IdleRunning,
    /// A reload was decided and the shell is performing it.
    Restarting,
    /// Quit requested; terminal.
    ShuttingDown,
}

/// Pure core runtime state.
///
/// This owns:
/// - the preload registry and its dirty flags
/// - the reload policy
/// - the set of changed preload files already reported to the user
#[derive(Debug)]
pub struct CoreRuntime {
    registry: PreloadRegistry,
    preload: PreloadSpec,
    policy: ReloadPolicy,
    state: LoopState,
    reported_stale: BTreeSet<PathBuf>,
}

impl CoreRuntime {
    pub fn new(preload: PreloadSpec, policy: ReloadPolicy) -> Self {
        let registry = PreloadRegistry::new(preload.modules.iter().cloned());
        Self {
            registry,
            preload,
            policy,
            state: LoopState::IdleRunning,
            reported_stale: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn registry(&self) -> &PreloadRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ReloadPolicy {
        &self.policy
    }

    /// Evict everything and load every preload module again, in order.
    ///
    /// Used at startup and for every full reload. Dirty flags are cleared and
    /// the stale warning is re-armed.
    pub fn load_preloads(&mut self, fs: &dyn FileSystem) -> Vec<PreloadFailure> {
        self.registry.evict_all();
        self.reported_stale.clear();
        self.registry.load_all(fs, &self.preload)
    }

    /// Path -> module index for the poller.
    pub fn preload_index(&self) -> PreloadIndex {
        self.registry.index()
    }

    /// Names handed to each child, in preload order.
    pub fn loaded_modules(&self) -> Vec<String> {
        self.registry.loaded_names()
    }

    /// The shell finished the transition started by a `Reload` command.
    pub fn reload_finished(&mut self) {
        if self.state == LoopState::Restarting {
            self.state = LoopState::IdleRunning;
        }
    }

    /// Handle one batch of events (everything pending when the loop
    /// dequeued), returning at most one reload.
    pub fn step(&mut self, events: Vec<ControlEvent>) -> CoreStep {
        if self.state == LoopState::ShuttingDown {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        let mut plan = ReloadPlan::new();
        let mut commands = Vec::new();

        for event in events {
            match event {
                ControlEvent::KeyPress(key) => handle_key(&mut plan, key),
                ControlEvent::FilesChanged(paths) => handle_files_changed(&mut plan, &paths),
                ControlEvent::PreloadChanged { paths, .. } => {
                    handle_preload_changed(&mut self.registry, &self.policy, &mut plan, &paths)
                }
                ControlEvent::Tick => {}
                ControlEvent::ChildExited { run_id, code } => {
                    commands.push(CoreCommand::ChildExited { run_id, code });
                }
                ControlEvent::Shutdown(reason) => {
                    debug!(?reason, "shutdown requested");
                    plan.request_quit();
                }
            }
        }

        if plan.quit() {
            self.state = LoopState::ShuttingDown;
            commands.push(CoreCommand::Shutdown);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        if let Some((kind, clear)) = plan.reload() {
            if kind == ReloadKind::Full {
                self.registry.clear_all();
                self.reported_stale.clear();
            }
            self.state = LoopState::Restarting;
            commands.push(CoreCommand::Reload {
                kind,
                clear: clear.max(self.policy.clear),
            });
        }

        if let Some(warning) = stale_warning(&self.registry, &self.policy, &mut self.reported_stale) {
            commands.push(warning);
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }
}
