//! Shared helpers for rekindle's integration tests.

pub mod builders;
pub mod fake_executor;
pub mod harness;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use rekindle::logging::{env_filter, LOG_ENV};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test subscriber once per test binary.
///
/// Uses the same `REKINDLE_LOG` filter as the binary, e.g.
/// `REKINDLE_LOG=rekindle::engine=debug cargo test`. Output is captured per
/// test and only shown for failures (or with `--nocapture`).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(std::env::var(LOG_ENV).ok().as_deref()))
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}
