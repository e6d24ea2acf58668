// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::config::ReloadPolicy;
use crate::engine::plan::ReloadPlan;
use crate::exec::RunId;
use crate::input::{decode_key, KeyCommand};
use crate::preload::PreloadRegistry;
use crate::types::{ClearMode, ReloadKind};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// A child exited on its own; record it and tell the user.
    ChildExited { run_id: RunId, code: i32 },
    /// Terminate the current child and start a new one.
    ///
    /// For `ReloadKind::Full` the shell evicts and reloads the preload
    /// registry in between.
    Reload { kind: ReloadKind, clear: ClearMode },
    /// Preloaded modules are out of date; suggest a full reload.
    WarnStale {
        modules: BTreeSet<String>,
        paths: BTreeSet<PathBuf>,
    },
    /// Terminate the current child and leave the loop.
    Shutdown,
}

/// Decision returned by the core after handling one batch of events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a keystroke. Unknown keys are ignored.
pub fn handle_key(plan: &mut ReloadPlan, key: char) {
    match decode_key(key) {
        Some(KeyCommand::Reload { kind, clear }) => {
            debug!(?key, %kind, ?clear, "reload key");
            plan.request(kind, clear);
        }
        Some(KeyCommand::Quit) => {
            debug!(?key, "quit key");
            plan.request_quit();
        }
        None => trace!(?key, "ignoring key"),
    }
}

/// Ordinary watched files changed: partial reload.
pub fn handle_files_changed(plan: &mut ReloadPlan, paths: &BTreeSet<PathBuf>) {
    if paths.is_empty() {
        return;
    }
    debug!(count = paths.len(), "files changed; partial reload");
    plan.request(ReloadKind::Partial, ClearMode::None);
}

/// Files backing preloaded modules changed.
///
/// Marks the affected entries dirty. With `auto_full_reload` this turns into
/// a full reload; otherwise the stale warning (if not silent) is produced
/// later from the dirty set.
pub fn handle_preload_changed(
    registry: &mut PreloadRegistry,
    policy: &ReloadPolicy,
    plan: &mut ReloadPlan,
    paths: &BTreeSet<PathBuf>,
) {
    let newly = registry.mark_dirty(paths);
    debug!(newly_dirty = ?newly, "preload files changed");

    if policy.auto_full_reload {
        plan.request(ReloadKind::Full, ClearMode::None);
    }
}

/// Stale warning, if the set of changed preload files differs from what was
/// last reported.
pub fn stale_warning(
    registry: &PreloadRegistry,
    policy: &ReloadPolicy,
    reported: &mut BTreeSet<PathBuf>,
) -> Option<CoreCommand> {
    if policy.silent {
        return None;
    }

    let paths = registry.dirty_paths();
    if paths.is_empty() || paths == *reported {
        return None;
    }

    *reported = paths.clone();
    Some(CoreCommand::WarnStale {
        modules: registry.any_dirty(),
        paths,
    })
}
