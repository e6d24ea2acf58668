// src/terminal.rs

//! Terminal handling: keyboard (cbreak) mode and screen clearing.

use std::io::{stdin, stdout, Write};

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use tracing::{debug, warn};

use crate::errors::{RekindleError, Result};
use crate::types::ClearMode;

/// Whether stdin is attached to a terminal.
pub fn stdin_is_tty() -> bool {
    nix::unistd::isatty(stdin()).unwrap_or(false)
}

/// Puts stdin into cbreak mode (no line buffering, no echo) for as long as it
/// lives.
///
/// Signals (`ISIG`) and output processing are left alone, so Ctrl-C still
/// raises SIGINT and the child's output renders normally. The saved settings
/// are restored exactly once, on drop, including during unwinding.
#[derive(Debug)]
pub struct TerminalGuard {
    saved: Termios,
}

impl TerminalGuard {
    pub fn acquire() -> Result<Self> {
        let fd = stdin();
        if !stdin_is_tty() {
            return Err(RekindleError::TerminalError("stdin is not a terminal".to_string()));
        }

        let saved = termios::tcgetattr(&fd)
            .map_err(|e| RekindleError::TerminalError(format!("reading terminal mode: {e}")))?;

        let mut raw = saved.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(&fd, SetArg::TCSANOW, &raw)
            .map_err(|e| RekindleError::TerminalError(format!("entering cbreak mode: {e}")))?;

        debug!("terminal switched to cbreak mode");
        Ok(Self { saved })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = termios::tcsetattr(stdin(), SetArg::TCSAFLUSH, &self.saved) {
            warn!(error = %e, "failed to restore terminal mode");
        } else {
            debug!("terminal mode restored");
        }
    }
}

/// Clear the terminal according to `mode`. `ClearMode::None` is a no-op.
///
/// Write errors are ignored.
pub fn clear(mode: ClearMode) {
    let mut out = stdout();
    match mode {
        ClearMode::None => return,
        ClearMode::Screen => {
            execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0)).ok();
        }
        ClearMode::Scrollback => {
            execute!(
                out,
                Clear(ClearType::All),
                Clear(ClearType::Purge),
                cursor::MoveTo(0, 0)
            )
            .ok();
        }
    }
    out.flush().ok();
}
