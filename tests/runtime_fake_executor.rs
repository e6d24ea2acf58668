// tests/runtime_fake_executor.rs

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use rekindle::config::ReloadPolicy;
use rekindle::errors::RekindleError;
use rekindle::fs::mock::MockFileSystem;
use rekindle::input::{ControlEvent, ShutdownReason};
use rekindle::types::{ClearMode, ReloadKind};
use rekindle_test_utils::builders::{policy, preload_spec};
use rekindle_test_utils::fake_executor::{FakeCall, FakeExecutor};
use rekindle_test_utils::harness::RuntimeHarness;
use rekindle_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("app.py", "import pandas");
    fs.add_file("pandas/__init__.py", "");
    fs
}

fn app_changed() -> ControlEvent {
    ControlEvent::FilesChanged([PathBuf::from("./app.py")].into())
}

#[tokio::test]
async fn first_start_carries_the_preload_list() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&["pandas"]), policy(false, false));

    harness.wait_for_starts(1).await;
    let start = &harness.log.starts()[0];
    assert_eq!(start.run_id, 1);
    assert_eq!(start.reload, None);
    assert_eq!(start.preload, vec!["pandas"]);
    assert_eq!(start.clear, ClearMode::None);

    assert!(harness
        .index
        .borrow()
        .contains(&PathBuf::from("./pandas/__init__.py")));

    assert_eq!(harness.quit().await?, 0);
    Ok(())
}

#[tokio::test]
async fn file_change_terminates_then_restarts() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&["pandas"]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness.send(app_changed()).await;
    harness.wait_for_starts(2).await;

    let calls = harness.log.calls();
    assert!(matches!(calls[1], FakeCall::Terminate(1)));
    match &calls[2] {
        FakeCall::Start(req) => {
            assert_eq!(req.run_id, 2);
            assert_eq!(req.reload, Some(ReloadKind::Partial));
            assert_eq!(req.preload, vec!["pandas"]);
        }
        other => panic!("expected a start, got {other:?}"),
    }

    assert_eq!(harness.quit().await?, 0);
    Ok(())
}

#[tokio::test]
async fn full_reload_key_reloads_the_registry() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&["pandas"]), policy(false, false));
    harness.wait_for_starts(1).await;

    // A new module file only becomes part of the index on a full reload.
    fs.add_file("pandas/io.py", "");
    harness.send(ControlEvent::KeyPress('R')).await;
    harness.wait_for_starts(2).await;

    assert_eq!(harness.log.reloads(), vec![ReloadKind::Full]);
    assert!(harness
        .index
        .borrow()
        .contains(&PathBuf::from("./pandas/io.py")));

    assert_eq!(harness.quit().await?, 0);
    Ok(())
}

#[tokio::test]
async fn batched_events_restart_once() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    // Queued before the loop can run again, so they form a single batch.
    harness.tx.try_send(app_changed())?;
    harness.tx.try_send(ControlEvent::KeyPress('c'))?;
    harness.tx.try_send(app_changed())?;

    harness.wait_for_starts(2).await;
    harness.settle().await;

    let starts = harness.log.starts();
    assert_eq!(starts.len(), 2);
    assert_eq!(starts[1].clear, ClearMode::Screen);
    assert!(starts[1].preload.is_empty());

    assert_eq!(harness.quit().await?, 0);
    Ok(())
}

#[tokio::test]
async fn quit_terminates_the_running_child() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    let log = harness.log.clone();
    assert_eq!(harness.quit().await?, 0);
    assert_eq!(log.terminations(), vec![1]);
    Ok(())
}

#[tokio::test]
async fn quit_during_a_reload_terminates_the_new_child() -> TestResult {
    init_tracing();
    let fs = project();
    let (executor, log) = FakeExecutor::new();
    let executor = executor.slow_from(2, Duration::from_millis(200));
    let harness =
        RuntimeHarness::spawn_with(&fs, preload_spec(&[]), policy(false, false), executor, log);
    harness.wait_for_starts(1).await;

    harness.send(app_changed()).await;
    // Run 1 is stopped and run 2 is still starting.
    harness.wait_until(|log| log.terminations() == vec![1]).await;
    assert_eq!(harness.log.starts().len(), 1);
    harness.send(ControlEvent::KeyPress('q')).await;

    let log = harness.log.clone();
    assert_eq!(harness.join().await?, 0);
    // The child started by the interrupted reload is stopped before exit.
    let calls = log.calls();
    assert_eq!(calls.len(), 4, "{calls:?}");
    assert!(matches!(&calls[0], FakeCall::Start(req) if req.run_id == 1));
    assert_eq!(calls[1], FakeCall::Terminate(1));
    assert!(matches!(&calls[2], FakeCall::Start(req) if req.run_id == 2));
    assert_eq!(calls[3], FakeCall::Terminate(2));
    Ok(())
}

#[tokio::test]
async fn signal_shutdown_terminates_the_running_child() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness
        .send(ControlEvent::Shutdown(ShutdownReason::Interrupt))
        .await;
    let log = harness.log.clone();
    assert_eq!(harness.join().await?, 0);
    assert_eq!(log.terminations(), vec![1]);
    Ok(())
}

#[tokio::test]
async fn quitting_after_an_exit_returns_the_child_code() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness
        .send(ControlEvent::ChildExited { run_id: 1, code: 3 })
        .await;
    let log = harness.log.clone();
    assert_eq!(harness.quit().await?, 3);
    // An exited child is not terminated again.
    assert!(log.terminations().is_empty());
    Ok(())
}

#[tokio::test]
async fn exit_of_a_replaced_run_is_ignored() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness.send(app_changed()).await;
    harness.wait_for_starts(2).await;

    harness
        .send(ControlEvent::ChildExited { run_id: 1, code: 7 })
        .await;
    let log = harness.log.clone();
    assert_eq!(harness.quit().await?, 0);
    assert_eq!(log.terminations(), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn exited_child_restarts_on_the_next_change() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&[]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness
        .send(ControlEvent::ChildExited { run_id: 1, code: 1 })
        .await;
    harness.send(app_changed()).await;
    harness.wait_for_starts(2).await;

    assert!(harness.log.terminations().is_empty());
    assert_eq!(harness.log.reloads(), vec![ReloadKind::Partial]);
    assert_eq!(harness.quit().await?, 0);
    Ok(())
}

#[tokio::test]
async fn failed_restart_keeps_watching() -> TestResult {
    init_tracing();
    let fs = project();
    let (executor, log) = FakeExecutor::new();
    let harness = RuntimeHarness::spawn_with(
        &fs,
        preload_spec(&[]),
        policy(false, false),
        executor.failing_from(2),
        log,
    );
    harness.wait_for_starts(1).await;

    harness.send(app_changed()).await;
    harness.wait_until(|log| log.terminations() == vec![1]).await;
    harness.settle().await;

    // Still alive: further changes are handled and quit works.
    harness.send(app_changed()).await;
    harness.settle().await;

    let log = harness.log.clone();
    assert_eq!(harness.quit().await?, 0);
    assert_eq!(log.starts().len(), 1);
    assert_eq!(log.terminations(), vec![1]);
    Ok(())
}

#[tokio::test]
async fn failed_first_start_is_fatal() {
    init_tracing();
    let fs = project();
    let (executor, log) = FakeExecutor::new();
    let harness = RuntimeHarness::spawn_with(
        &fs,
        preload_spec(&[]),
        policy(false, false),
        executor.failing_from(1),
        log,
    );

    let result = harness.join().await;
    assert!(matches!(result, Err(RekindleError::TargetError(_))));
}

#[tokio::test]
async fn preload_changes_without_auto_reload_do_not_restart() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(&fs, preload_spec(&["pandas"]), policy(false, false));
    harness.wait_for_starts(1).await;

    harness
        .send(ControlEvent::PreloadChanged {
            modules: ["pandas".to_string()].into(),
            paths: [PathBuf::from("./pandas/__init__.py")].into(),
        })
        .await;
    harness.settle().await;
    assert_eq!(harness.log.starts().len(), 1);

    let log = harness.log.clone();
    assert_eq!(harness.quit().await?, 0);
    assert_eq!(log.terminations(), vec![1]);
    Ok(())
}

#[tokio::test]
async fn auto_full_reload_restarts_on_preload_changes() -> TestResult {
    init_tracing();
    let fs = project();
    let harness = RuntimeHarness::spawn(
        &fs,
        preload_spec(&["pandas"]),
        ReloadPolicy {
            clear: ClearMode::Screen,
            ..policy(false, true)
        },
    );
    harness.wait_for_starts(1).await;

    harness
        .send(ControlEvent::PreloadChanged {
            modules: ["pandas".to_string()].into(),
            paths: [PathBuf::from("./pandas/__init__.py")].into(),
        })
        .await;
    harness.wait_for_starts(2).await;

    let starts = harness.log.starts();
    assert_eq!(starts[1].reload, Some(ReloadKind::Full));
    assert_eq!(starts[1].clear, ClearMode::Screen);
    assert_eq!(harness.quit().await?, 0);
    Ok(())
}
