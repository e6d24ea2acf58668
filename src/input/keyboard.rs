// src/input/keyboard.rs

//! Keystroke reader.
//!
//! Runs on its own OS thread because reading stdin blocks. The terminal must
//! already be in cbreak mode (see [`crate::terminal::TerminalGuard`]) for
//! keys to arrive without Enter.

use std::io::{self, Read};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::ControlEvent;

/// Spawn the reader thread. It ends on EOF, on a read error, or once the
/// control loop is gone.
///
/// The thread is detached: at shutdown it may still be blocked in `read`,
/// which is harmless since the process is exiting.
pub fn spawn_keyboard_reader(tx: mpsc::Sender<ControlEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("rekindle-keyboard".to_string())
        .spawn(move || read_keys(io::stdin().lock(), tx))?;
    Ok(())
}

/// Read bytes from `input` and forward each ASCII byte as a key press.
pub fn read_keys<R: Read>(mut input: R, tx: mpsc::Sender<ControlEvent>) {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => {
                debug!("keyboard input closed");
                return;
            }
            Ok(_) => {
                let byte = buf[0];
                if !byte.is_ascii() {
                    trace!(byte, "ignoring non-ascii input byte");
                    continue;
                }
                let key = char::from(byte);
                trace!(?key, "key pressed");
                if tx.blocking_send(ControlEvent::KeyPress(key)).is_err() {
                    debug!("control loop gone; keyboard reader stopping");
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "reading keyboard failed; keyboard control disabled");
                return;
            }
        }
    }
}
