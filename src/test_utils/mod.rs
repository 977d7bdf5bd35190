//! Test utilities for the updater
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests:
//! - [`MockFetcher`] - scripted network responses with a request log
//! - [`fixtures`] - sample PKGBUILDs, QQ download pages and `packages.yaml`
//! - [`init_test_logging`] - opt-in tracing output for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use aur_updater::core::Architecture;
//! use aur_updater::test_utils::{MockFetcher, fixtures};
//!
//! let page = fixtures::qq_page("3.2.19_250904", &[Architecture::X86_64]);
//! let fetcher = MockFetcher::new().with_text("https://im.qq.com/linuxqq/", page);
//! ```

pub mod fixtures;
pub mod mock_fetcher;

pub use fixtures::PkgbuildFixture;
pub use mock_fetcher::MockFetcher;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, tests stay quiet.
///
/// ```bash
/// RUST_LOG=aur_updater=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
