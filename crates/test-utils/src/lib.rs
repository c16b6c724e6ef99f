//! Shared helpers for podstep's integration tests: config builders, a
//! stand-in control plane for [`podstep::FakePodClient`], and test logging.

pub mod builders;
pub mod fake_cluster;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use podstep::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for any single pod step run in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Quiet everything but the crate under test and these helpers.
const DEFAULT_FILTER: &str = "warn,podstep=debug,podstep_test_utils=debug";

static INIT: Once = Once::new();

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// or with `--nocapture`. `PODSTEP_LOG` takes a filter directive, e.g.
/// `PODSTEP_LOG=podstep::steps=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("pod step did not finish within {TEST_TIMEOUT:?}"),
    }
}
