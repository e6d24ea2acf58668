// tests/core_policy.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use rekindle::config::ReloadPolicy;
use rekindle::engine::{CoreCommand, CoreRuntime, CoreStep, LoopState};
use rekindle::fs::mock::MockFileSystem;
use rekindle::input::{ControlEvent, ShutdownReason};
use rekindle::types::{ClearMode, ReloadKind};
use rekindle_test_utils::builders::{policy, preload_spec};

fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("app.py", "import pandas");
    fs.add_file("pandas/__init__.py", "");
    fs.add_file("pandas/core/frame.py", "");
    fs
}

/// Core with `pandas` preloaded against [`project`].
fn core_with(policy: ReloadPolicy) -> CoreRuntime {
    let mut core = CoreRuntime::new(preload_spec(&["pandas"]), policy);
    let failures = core.load_preloads(&project());
    assert!(failures.is_empty(), "{failures:?}");
    core
}

fn files_changed(items: &[&str]) -> ControlEvent {
    ControlEvent::FilesChanged(paths(items))
}

fn pandas_changed() -> ControlEvent {
    ControlEvent::PreloadChanged {
        modules: names(&["pandas"]),
        paths: paths(&["./pandas/core/frame.py"]),
    }
}

fn reload(kind: ReloadKind, clear: ClearMode) -> CoreCommand {
    CoreCommand::Reload { kind, clear }
}

fn reloads(step: &CoreStep) -> Vec<(ReloadKind, ClearMode)> {
    step.commands
        .iter()
        .filter_map(|cmd| match cmd {
            CoreCommand::Reload { kind, clear } => Some((*kind, *clear)),
            _ => None,
        })
        .collect()
}

/// Run a single key through a fresh core.
fn step_key(key: char) -> CoreStep {
    let mut core = core_with(policy(false, false));
    core.step(vec![ControlEvent::KeyPress(key)])
}

#[test]
fn reload_keys_map_to_reload_commands() {
    assert_eq!(
        step_key('r').commands,
        vec![reload(ReloadKind::Partial, ClearMode::None)]
    );
    assert_eq!(
        step_key(' ').commands,
        vec![reload(ReloadKind::Partial, ClearMode::None)]
    );
    assert_eq!(
        step_key('R').commands,
        vec![reload(ReloadKind::Full, ClearMode::None)]
    );
    assert_eq!(
        step_key('c').commands,
        vec![reload(ReloadKind::Partial, ClearMode::Screen)]
    );
    assert_eq!(
        step_key('C').commands,
        vec![reload(ReloadKind::Partial, ClearMode::Scrollback)]
    );
}

#[test]
fn quit_keys_stop_the_loop() {
    for key in ['q', '\u{3}'] {
        let step = step_key(key);
        assert_eq!(step.commands, vec![CoreCommand::Shutdown]);
        assert!(!step.keep_running);
    }
}

#[test]
fn unknown_keys_and_ticks_do_nothing() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![
        ControlEvent::KeyPress('x'),
        ControlEvent::KeyPress('\n'),
        ControlEvent::Tick,
    ]);
    assert!(step.commands.is_empty());
    assert!(step.keep_running);
    assert_eq!(core.state(), LoopState::IdleRunning);
}

#[test]
fn key_and_pending_change_collapse_into_one_partial_reload() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![
        ControlEvent::KeyPress('r'),
        files_changed(&["./app.py"]),
        files_changed(&["./lib.py"]),
    ]);
    assert_eq!(reloads(&step), vec![(ReloadKind::Partial, ClearMode::None)]);
}

#[test]
fn full_beats_partial_and_strongest_clear_wins() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![
        ControlEvent::KeyPress('c'),
        ControlEvent::KeyPress('R'),
        ControlEvent::KeyPress('C'),
        files_changed(&["./app.py"]),
    ]);
    assert_eq!(
        reloads(&step),
        vec![(ReloadKind::Full, ClearMode::Scrollback)]
    );
}

#[test]
fn quit_overrides_every_reload_in_the_batch() {
    let mut core = core_with(policy(false, true));
    let step = core.step(vec![
        ControlEvent::KeyPress('R'),
        files_changed(&["./app.py"]),
        ControlEvent::KeyPress('q'),
        ControlEvent::KeyPress('r'),
    ]);
    assert_eq!(step.commands, vec![CoreCommand::Shutdown]);
    assert!(!step.keep_running);
    assert_eq!(core.state(), LoopState::ShuttingDown);

    // Once shutting down nothing else is decided.
    let after = core.step(vec![ControlEvent::KeyPress('r')]);
    assert!(after.commands.is_empty());
    assert!(!after.keep_running);
}

#[test]
fn signals_shut_down_like_quit() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![ControlEvent::Shutdown(ShutdownReason::Terminate)]);
    assert_eq!(step.commands, vec![CoreCommand::Shutdown]);
    assert!(!step.keep_running);
}

#[test]
fn policy_clear_applies_to_every_reload() {
    let mut core = core_with(ReloadPolicy {
        clear: ClearMode::Screen,
        ..policy(false, false)
    });
    let step = core.step(vec![files_changed(&["./app.py"])]);
    assert_eq!(reloads(&step), vec![(ReloadKind::Partial, ClearMode::Screen)]);
    core.reload_finished();

    // A stronger key clear still wins.
    let step = core.step(vec![ControlEvent::KeyPress('C')]);
    assert_eq!(
        reloads(&step),
        vec![(ReloadKind::Partial, ClearMode::Scrollback)]
    );
}

#[test]
fn ordinary_change_gives_exactly_one_partial_reload() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![files_changed(&["./app.py"])]);

    assert_eq!(
        step.commands,
        vec![reload(ReloadKind::Partial, ClearMode::None)]
    );
    assert_eq!(core.state(), LoopState::Restarting);
    core.reload_finished();
    assert_eq!(core.state(), LoopState::IdleRunning);
    assert!(core.registry().any_dirty().is_empty());
}

#[test]
fn preload_change_warns_once_without_reloading() {
    let mut core = core_with(policy(false, false));

    let step = core.step(vec![pandas_changed()]);
    assert_eq!(
        step.commands,
        vec![CoreCommand::WarnStale {
            modules: names(&["pandas"]),
            paths: paths(&["./pandas/core/frame.py"]),
        }]
    );
    assert!(reloads(&step).is_empty());
    assert!(core.registry().get("pandas").expect("pandas").is_dirty());

    // The same change again is not reported twice.
    let step = core.step(vec![pandas_changed()]);
    assert!(step.commands.is_empty());

    // A partial reload keeps the preloaded module dirty.
    let step = core.step(vec![ControlEvent::KeyPress('r')]);
    assert_eq!(
        step.commands,
        vec![reload(ReloadKind::Partial, ClearMode::None)]
    );
    core.reload_finished();
    assert!(core.registry().get("pandas").expect("pandas").is_dirty());
}

#[test]
fn another_changed_preload_file_is_reported_again() {
    let mut core = core_with(policy(false, false));
    core.step(vec![pandas_changed()]);

    let step = core.step(vec![ControlEvent::PreloadChanged {
        modules: names(&["pandas"]),
        paths: paths(&["./pandas/__init__.py"]),
    }]);
    assert_eq!(
        step.commands,
        vec![CoreCommand::WarnStale {
            modules: names(&["pandas"]),
            paths: paths(&["./pandas/__init__.py", "./pandas/core/frame.py"]),
        }]
    );
}

#[test]
fn auto_full_reload_turns_preload_changes_into_full_reloads() {
    let mut core = core_with(policy(false, true));

    let step = core.step(vec![pandas_changed(), files_changed(&["./app.py"])]);
    assert_eq!(
        step.commands,
        vec![reload(ReloadKind::Full, ClearMode::None)]
    );
    assert!(!core.registry().get("pandas").expect("pandas").is_dirty());
    assert!(core.registry().any_dirty().is_empty());
}

#[test]
fn silent_policy_neither_warns_nor_reloads() {
    let mut core = core_with(policy(true, false));

    let step = core.step(vec![pandas_changed()]);
    assert!(step.commands.is_empty());
    assert!(step.keep_running);
    assert!(core.registry().get("pandas").expect("pandas").is_dirty());
}

#[test]
fn auto_full_reload_still_applies_when_silent() {
    let mut core = core_with(policy(true, true));

    // Silent only suppresses the warning; the explicit auto reload stands.
    let step = core.step(vec![pandas_changed()]);
    assert_eq!(
        step.commands,
        vec![reload(ReloadKind::Full, ClearMode::None)]
    );
    core.reload_finished();
    assert!(core.registry().any_dirty().is_empty());
}

#[test]
fn full_reload_key_clears_dirty_flags_and_rearms_the_warning() {
    let mut core = core_with(policy(false, false));
    core.step(vec![pandas_changed()]);

    let step = core.step(vec![ControlEvent::KeyPress('R')]);
    assert_eq!(
        step.commands,
        vec![reload(ReloadKind::Full, ClearMode::None)]
    );
    core.reload_finished();
    assert!(core.registry().any_dirty().is_empty());

    // The same file changing after the full reload is news again.
    let step = core.step(vec![pandas_changed()]);
    assert!(matches!(
        step.commands.as_slice(),
        [CoreCommand::WarnStale { .. }]
    ));
}

#[test]
fn child_exits_pass_through_in_order() {
    let mut core = core_with(policy(false, false));
    let step = core.step(vec![
        ControlEvent::ChildExited { run_id: 1, code: 3 },
        files_changed(&["./app.py"]),
    ]);
    assert_eq!(
        step.commands,
        vec![
            CoreCommand::ChildExited { run_id: 1, code: 3 },
            reload(ReloadKind::Partial, ClearMode::None),
        ]
    );
}

#[test]
fn unresolvable_preloads_are_reported_and_skipped() {
    let mut core = CoreRuntime::new(preload_spec(&["pandas", "numpy"]), policy(false, false));
    let failures = core.load_preloads(&project());

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].module, "numpy");
    assert_eq!(core.loaded_modules(), vec!["pandas"]);
    assert!(core.preload_index().contains(&PathBuf::from("./pandas/__init__.py")));
}
