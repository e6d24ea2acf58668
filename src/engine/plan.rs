// src/engine/plan.rs

//! Debounce accumulator for one batch of control events.

use crate::types::{ClearMode, ReloadKind};

/// Collapses every reload request of a batch into at most one reload.
///
/// - Strongest kind wins: full > partial.
/// - Strongest clear wins: scrollback > screen > none.
/// - A quit anywhere in the batch overrides every reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadPlan {
    kind: Option<ReloadKind>,
    clear: ClearMode,
    quit: bool,
}

impl ReloadPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, kind: ReloadKind, clear: ClearMode) {
        self.kind = Some(self.kind.map_or(kind, |k| k.max(kind)));
        self.clear = self.clear.max(clear);
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit(&self) -> bool {
        self.quit
    }

    /// The merged reload, if any. `None` when quitting.
    pub fn reload(&self) -> Option<(ReloadKind, ClearMode)> {
        if self.quit {
            return None;
        }
        self.kind.map(|kind| (kind, self.clear))
    }
}
