// src/input/signals.rs

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{ControlEvent, ShutdownReason};
use crate::errors::Result;

/// Turn SIGINT and SIGTERM into [`ControlEvent::Shutdown`].
///
/// Handlers are installed before this returns, so a signal arriving right
/// after startup is not lost.
pub fn spawn_signal_listener(tx: mpsc::Sender<ControlEvent>) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = interrupt.recv() => ShutdownReason::Interrupt,
                Some(()) = terminate.recv() => ShutdownReason::Terminate,
                else => break,
            };
            info!(?reason, "shutdown signal received");
            if tx.send(ControlEvent::Shutdown(reason)).await.is_err() {
                break;
            }
        }
        debug!("signal listener finished");
    });

    Ok(())
}
