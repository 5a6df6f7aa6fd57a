//! Shared helpers for the `sidepipe` integration tests.

pub mod builders;
pub mod fake_invoker;
pub mod fds;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single test invocation. Engine tests use budgets of a
/// few hundred milliseconds, so hitting this means the engine hung.
pub const TEST_DEADLINE: Duration = Duration::from_secs(10);

/// Install a per-test capturing subscriber once per test binary.
///
/// Output only shows for failing tests (or with `--nocapture`). The filter
/// comes from `RUST_LOG`, e.g. `RUST_LOG=sidepipe::invoke=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("test exceeded {TEST_DEADLINE:?}; invocation hung"))
}
