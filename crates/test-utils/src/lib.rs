pub mod builders;
pub mod fake_executor;
pub mod probe;

pub use builders::{Behavior, FakeTask};
pub use fake_executor::FakeExecutor;
pub use probe::{Probe, ProbeEvent};

use std::sync::Arc;
use std::sync::Once;

use builddag::fs::mock::MockFileSystem;
use builddag::{ExecConfig, MemorySink, RunContext};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Context over a fresh [`MockFileSystem`] with a [`MemorySink`]; both are
/// returned so tests can seed files and inspect diagnostics.
pub fn mock_context(config: ExecConfig) -> (RunContext, MockFileSystem, MemorySink) {
    let fs = MockFileSystem::new();
    let sink = MemorySink::new();
    let ctx = RunContext::new(config, Arc::new(sink.clone()), Arc::new(fs.clone()));
    (ctx, fs, sink)
}
