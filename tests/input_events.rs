// tests/input_events.rs

use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use rekindle::engine::ReloadPlan;
use rekindle::fs::mock::MockFileSystem;
use rekindle::input::keyboard::read_keys;
use rekindle::input::{decode_key, spawn_poller, ControlEvent, InputMultiplexer, KeyCommand};
use rekindle::preload::PreloadRegistry;
use rekindle::types::{ClearMode, ReloadKind};
use rekindle::watch::SnapshotTracker;
use rekindle_test_utils::builders::{preload_spec, watch_spec};
use rekindle_test_utils::{init_tracing, with_timeout};

#[test]
fn key_table() {
    let partial = Some(KeyCommand::Reload {
        kind: ReloadKind::Partial,
        clear: ClearMode::None,
    });
    assert_eq!(decode_key('r'), partial);
    assert_eq!(decode_key(' '), partial);
    assert_eq!(
        decode_key('R'),
        Some(KeyCommand::Reload {
            kind: ReloadKind::Full,
            clear: ClearMode::None,
        })
    );
    assert_eq!(
        decode_key('c'),
        Some(KeyCommand::Reload {
            kind: ReloadKind::Partial,
            clear: ClearMode::Screen,
        })
    );
    assert_eq!(
        decode_key('C'),
        Some(KeyCommand::Reload {
            kind: ReloadKind::Partial,
            clear: ClearMode::Scrollback,
        })
    );
    assert_eq!(decode_key('q'), Some(KeyCommand::Quit));
    assert_eq!(decode_key('\u{3}'), Some(KeyCommand::Quit));
    assert_eq!(decode_key('Q'), None);
    assert_eq!(decode_key('\n'), None);
}

#[test]
fn plan_merges_to_the_strongest_request() {
    let mut plan = ReloadPlan::new();
    assert_eq!(plan.reload(), None);

    plan.request(ReloadKind::Partial, ClearMode::Scrollback);
    plan.request(ReloadKind::Full, ClearMode::None);
    plan.request(ReloadKind::Partial, ClearMode::Screen);
    assert_eq!(plan.reload(), Some((ReloadKind::Full, ClearMode::Scrollback)));

    plan.request_quit();
    assert!(plan.quit());
    assert_eq!(plan.reload(), None);
}

#[test]
fn reader_forwards_ascii_bytes_until_eof() {
    let (tx, mut rx) = mpsc::channel(16);
    read_keys(Cursor::new(b"rR\xffq".to_vec()), tx);

    let mut keys = Vec::new();
    while let Ok(event) = rx.try_recv() {
        keys.push(event);
    }
    assert_eq!(
        keys,
        vec![
            ControlEvent::KeyPress('r'),
            ControlEvent::KeyPress('R'),
            ControlEvent::KeyPress('q'),
        ]
    );
}

#[test]
fn reader_stops_once_the_loop_is_gone() {
    let (tx, rx) = mpsc::channel(16);
    drop(rx);
    // Returns instead of reading the rest of the input.
    read_keys(Cursor::new(b"rrrr".to_vec()), tx);
}

#[tokio::test]
async fn multiplexer_batches_everything_pending() {
    let mut input = InputMultiplexer::new(8);
    let keyboard = input.sender();
    let poller = input.sender();

    keyboard.send(ControlEvent::KeyPress('r')).await.unwrap();
    poller.send(ControlEvent::Tick).await.unwrap();
    keyboard.send(ControlEvent::KeyPress('q')).await.unwrap();

    let batch = with_timeout(input.next_batch()).await.expect("batch");
    assert_eq!(
        batch,
        vec![
            ControlEvent::KeyPress('r'),
            ControlEvent::Tick,
            ControlEvent::KeyPress('q'),
        ]
    );
    assert!(input.drain_pending().is_empty());

    poller.send(ControlEvent::Tick).await.unwrap();
    let batch = with_timeout(input.next_batch()).await.expect("batch");
    assert_eq!(batch, vec![ControlEvent::Tick]);
}

#[tokio::test]
async fn poller_splits_ordinary_and_preload_changes() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("src/app.py", "v1");
    fs.add_file("vendor/pandas.py", "v1");

    let mut registry = PreloadRegistry::from_list("pandas");
    let spec = rekindle::config::PreloadSpec {
        search_paths: vec![PathBuf::from("./vendor")],
        ..preload_spec(&["pandas"])
    };
    assert!(registry.load_all(&fs, &spec).is_empty());

    // The preload file lies outside the glob and is tracked through the index.
    let tracker = SnapshotTracker::new(Arc::new(fs.clone()), watch_spec(".", &["src/**/*.py"], false))
        .expect("tracker");
    let (_index_tx, index_rx) = watch::channel(Arc::new(registry.index()));
    let (tx, mut rx) = mpsc::channel(64);
    let _poller = spawn_poller(tracker, index_rx, tx);

    // A tick means the baseline is in place.
    with_timeout(async {
        while rx.recv().await != Some(ControlEvent::Tick) {}
    })
    .await;

    fs.add_file("src/app.py", "v2");
    fs.add_file("vendor/pandas.py", "v2");

    let mut ordinary: BTreeSet<PathBuf> = BTreeSet::new();
    let mut preload: BTreeSet<PathBuf> = BTreeSet::new();
    let mut modules: BTreeSet<String> = BTreeSet::new();
    with_timeout(async {
        while ordinary.is_empty() || preload.is_empty() {
            match rx.recv().await {
                Some(ControlEvent::FilesChanged(paths)) => ordinary.extend(paths),
                Some(ControlEvent::PreloadChanged { modules: m, paths }) => {
                    modules.extend(m);
                    preload.extend(paths);
                }
                Some(_) => {}
                None => panic!("poller stopped"),
            }
        }
    })
    .await;

    assert_eq!(ordinary, BTreeSet::from([PathBuf::from("./src/app.py")]));
    assert_eq!(preload, BTreeSet::from([PathBuf::from("./vendor/pandas.py")]));
    assert_eq!(modules, BTreeSet::from(["pandas".to_string()]));
}
