// src/lib.rs

#[macro_use]
pub mod status;

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod input;
pub mod logging;
pub mod preload;
pub mod terminal;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch as watch_channel};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_optional, SupervisorConfig};
use crate::engine::{CoreRuntime, Runtime};
use crate::exec::RealExecutorBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::input::{
    spawn_keyboard_reader, spawn_poller, spawn_signal_listener, ControlEvent, InputMultiplexer,
};
use crate::preload::{LoadState, PreloadIndex, PreloadRegistry};
use crate::terminal::TerminalGuard;
use crate::types::KeyboardMode;
use crate::watch::path_utils::display_path;
use crate::watch::SnapshotTracker;

/// High-level entry point used by `main.rs`. Returns the exit code.
///
/// This wires together:
/// - config loading (CLI over `Rekindle.toml` over defaults)
/// - target validation
/// - keyboard, file poller and signal producers
/// - executor
/// - the control loop
pub async fn run(args: CliArgs) -> Result<i32> {
    let file = load_optional(args.config.as_deref())?;
    let config = SupervisorConfig::resolve(&args, file.as_ref())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.dry_run {
        print_dry_run(&config, fs.as_ref());
        return Ok(0);
    }

    let program = config.target.validate()?;
    debug!(program = %program.display(), "target resolved");

    let input = InputMultiplexer::default();
    spawn_signal_listener(input.sender())?;

    // Held until the end of this function; restores the terminal on every
    // exit path, including unwinding.
    let _terminal = setup_keyboard(config.keyboard, input.sender())?;

    let (index_tx, index_rx) = watch_channel::channel(Arc::new(PreloadIndex::default()));
    let tracker = SnapshotTracker::new(fs.clone(), config.watch.clone())?;
    let _poller = spawn_poller(tracker, index_rx, input.sender());

    let executor = RealExecutorBackend::new(config.target.clone(), config.stop, input.sender());
    let core = CoreRuntime::new(config.preload.clone(), config.policy);

    info!(target = %config.target.display(), "starting supervisor");
    status!("running {}", config.target.display());

    let runtime = Runtime::new(core, input, executor, fs, index_tx);
    let code = runtime.run().await?;
    Ok(code)
}

/// Enter cbreak mode and start the keystroke reader, as far as `mode` asks.
fn setup_keyboard(
    mode: KeyboardMode,
    tx: mpsc::Sender<ControlEvent>,
) -> Result<Option<TerminalGuard>> {
    let guard = match mode {
        KeyboardMode::Off => {
            debug!("keyboard control disabled");
            return Ok(None);
        }
        KeyboardMode::Required => TerminalGuard::acquire()?,
        KeyboardMode::Auto => match TerminalGuard::acquire() {
            Ok(guard) => guard,
            Err(err) => {
                warn!(error = %err, "keyboard control unavailable");
                status!("keyboard control unavailable ({err}); reloading on file changes only");
                return Ok(None);
            }
        },
    };

    spawn_keyboard_reader(tx)?;
    Ok(Some(guard))
}

/// Print the effective configuration and preload resolution.
fn print_dry_run(config: &SupervisorConfig, fs: &dyn FileSystem) {
    println!("rekindle dry-run");
    println!("  target: {}", config.target.display());
    println!("  watch.glob: {:?}", config.watch.patterns);
    if !config.watch.exclude.is_empty() {
        println!("  watch.exclude: {:?}", config.watch.exclude);
    }
    println!("  watch.interval: {:?}", config.watch.interval);
    println!("  watch.use_hash: {}", config.watch.use_hash);
    println!("  run.clear: {:?}", config.policy.clear);
    println!("  run.stop_signal: {:?}", config.stop.signal);
    println!("  run.grace_period: {:?}", config.stop.grace_period);
    println!("  run.keyboard: {:?}", config.keyboard);
    println!("  preload.silent: {}", config.policy.silent);
    println!("  preload.auto_full_reload: {}", config.policy.auto_full_reload);
    println!();

    let mut registry = PreloadRegistry::new(config.preload.modules.iter().cloned());
    registry.load_all(fs, &config.preload);

    println!("preload ({}):", registry.entries().len());
    for entry in registry.entries() {
        match entry.state() {
            LoadState::Loaded => {
                println!("  - {}", entry.name());
                for path in entry.backing() {
                    println!("      {}", display_path(path));
                }
            }
            LoadState::Failed(reason) => println!("  - {} (unresolved: {reason})", entry.name()),
            LoadState::Unloaded => println!("  - {} (unresolved)", entry.name()),
        }
    }

    debug!("dry-run complete (nothing started)");
}
