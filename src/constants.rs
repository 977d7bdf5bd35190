//! Global constants used throughout the updater.
//!
//! Default network settings, artifact locations and parallelism limits live
//! here so the CLI defaults and [`UpdaterConfig`](crate::config::UpdaterConfig)
//! defaults stay in one place.

use std::time::Duration;

/// Directory, relative to the working directory, where artifacts are downloaded.
pub const DOWNLOAD_DIR: &str = "downloads";

/// Default package configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "packages.yaml";

/// Browser-like user agent; several upstream download pages reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.4472.124 Safari/537.36";

/// Default `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "*/*";

/// Default `Cache-Control` header sent with every request.
pub const DEFAULT_CACHE_CONTROL: &str = "no-cache";

/// Per-request network timeout (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of retries after the first failed request.
pub const DEFAULT_RETRIES: usize = 2;

/// Multiplier for the exponential backoff between retries.
///
/// With a base of 2ms this yields 200ms, 400ms, 800ms, ...
pub const BACKOFF_FACTOR_MS: u64 = 100;

/// Maximum backoff delay between retries (2 seconds).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2_000;

/// Maximum number of per-architecture downloads running at once.
///
/// There are only four architectures, so this mostly bounds load on a
/// single upstream mirror.
pub const DEFAULT_MAX_PARALLEL_DOWNLOADS: usize = 4;

/// Extension used for artifacts whose URL carries no recognizable one.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "deb";
