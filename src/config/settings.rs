//! Runtime settings for an update run.

use crate::constants::{
    DEFAULT_MAX_PARALLEL_DOWNLOADS, DEFAULT_RETRIES, DEFAULT_TIMEOUT, DOWNLOAD_DIR,
};
use crate::fetcher::FetcherOptions;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Settings passed explicitly to [`PackageUpdater::new`](crate::updater::PackageUpdater::new).
///
/// # Examples
///
/// ```rust
/// use aur_updater::config::UpdaterConfig;
/// use std::path::PathBuf;
///
/// let config = UpdaterConfig {
///     recipe_root: PathBuf::from("/srv/aur"),
///     max_parallel_downloads: 1,
///     ..UpdaterConfig::default()
/// };
/// assert_eq!(config.download_dir, PathBuf::from("downloads"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Directory receiving downloaded artifacts, created on demand
    pub download_dir: PathBuf,
    /// Base for relative `pkgbuild` paths
    pub recipe_root: PathBuf,
    /// Connect and read timeout for every request
    pub timeout: Duration,
    /// Upper bound on concurrent per-architecture downloads of one package
    pub max_parallel_downloads: usize,
    /// Retries of transient network failures
    pub retries: usize,
    /// Extra request headers, overriding the defaults
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DOWNLOAD_DIR),
            recipe_root: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
            max_parallel_downloads: DEFAULT_MAX_PARALLEL_DOWNLOADS,
            retries: DEFAULT_RETRIES,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl UpdaterConfig {
    /// Options for building an [`HttpFetcher`](crate::fetcher::HttpFetcher).
    #[must_use]
    pub fn fetcher_options(&self) -> FetcherOptions {
        FetcherOptions {
            timeout: self.timeout,
            retries: self.retries,
            extra_headers: self.extra_headers.clone(),
        }
    }

    /// Download concurrency, never below one.
    #[must_use]
    pub fn download_concurrency(&self) -> usize {
        self.max_parallel_downloads.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpdaterConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_parallel_downloads, 4);
        assert_eq!(config.fetcher_options().retries, 2);
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let config = UpdaterConfig {
            max_parallel_downloads: 0,
            ..UpdaterConfig::default()
        };
        assert_eq!(config.download_concurrency(), 1);
    }
}
