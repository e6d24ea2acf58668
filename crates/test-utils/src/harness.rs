use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use rekindle::config::{PreloadSpec, ReloadPolicy};
use rekindle::engine::{CoreRuntime, Runtime};
use rekindle::errors::Result;
use rekindle::fs::mock::MockFileSystem;
use rekindle::input::{ControlEvent, InputMultiplexer};
use rekindle::preload::PreloadIndex;

use crate::fake_executor::{FakeExecutor, FakeLog};

/// A control loop running on a [`FakeExecutor`] and a [`MockFileSystem`].
///
/// Tests push events through [`send`](Self::send) and observe the
/// executor log.
pub struct RuntimeHarness {
    pub tx: mpsc::Sender<ControlEvent>,
    pub log: FakeLog,
    pub index: watch::Receiver<Arc<PreloadIndex>>,
    handle: JoinHandle<Result<i32>>,
}

impl RuntimeHarness {
    pub fn spawn(fs: &MockFileSystem, preload: PreloadSpec, policy: ReloadPolicy) -> Self {
        let (executor, log) = FakeExecutor::new();
        Self::spawn_with(fs, preload, policy, executor, log)
    }

    pub fn spawn_with(
        fs: &MockFileSystem,
        preload: PreloadSpec,
        policy: ReloadPolicy,
        executor: FakeExecutor,
        log: FakeLog,
    ) -> Self {
        let input = InputMultiplexer::default();
        let tx = input.sender();
        let (index_tx, index) = watch::channel(Arc::new(PreloadIndex::default()));
        let core = CoreRuntime::new(preload, policy);
        let runtime = Runtime::new(core, input, executor, Arc::new(fs.clone()), index_tx);
        let handle = tokio::spawn(runtime.run());

        Self {
            tx,
            log,
            index,
            handle,
        }
    }

    pub async fn send(&self, event: ControlEvent) {
        self.tx.send(event).await.expect("runtime alive");
    }

    /// Wait until the executor saw at least `n` starts.
    pub async fn wait_for_starts(&self, n: usize) {
        self.wait_until(|log| log.starts().len() >= n).await;
    }

    /// Poll the log until `done` holds (panics after 5 seconds).
    pub async fn wait_until(&self, done: impl Fn(&FakeLog) -> bool) {
        crate::with_timeout(async {
            while !done(&self.log) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
    }

    /// Give the loop time to process everything queued so far.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    /// Press `q` and wait for the loop to finish.
    pub async fn quit(self) -> Result<i32> {
        self.send(ControlEvent::KeyPress('q')).await;
        self.join().await
    }

    /// Wait for the loop to finish on its own.
    pub async fn join(self) -> Result<i32> {
        crate::with_timeout(self.handle)
            .await
            .expect("runtime task panicked")
    }
}
