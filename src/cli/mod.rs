//! Command-line interface
//!
//! The binary has a single mode of operation selected by flags:
//!
//! - `--list` prints the configured packages
//! - `--package NAME` updates one package
//! - `--all` (the default) updates every package and prints a summary
//!
//! # Examples
//!
//! ```bash
//! aur-updater --list
//! aur-updater -p linuxqq --verbose
//! aur-updater --config ~/aur/packages.yaml --download-dir /tmp/artifacts --jobs 2
//! ```
//!
//! # Exit Status
//!
//! `0` when every selected package is up to date afterwards, `1` when any
//! package failed or the configuration could not be used.

mod list;
mod update;

use crate::config::{PackagesConfig, UpdaterConfig};
use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_MAX_PARALLEL_DOWNLOADS, DEFAULT_RETRIES, DOWNLOAD_DIR,
};
use crate::fetcher::HttpFetcher;
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags, applied before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log filter, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Suppress progress output on stdout
    pub quiet: bool,
}

impl CliConfig {
    /// Install the tracing subscriber. Logs go to stderr.
    ///
    /// `RUST_LOG` takes precedence over [`log_level`](Self::log_level).
    /// Calling this more than once is harmless.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Keep AUR PKGBUILDs in sync with upstream releases.
#[derive(Parser, Debug)]
#[command(
    name = "aur-updater",
    about = "Update PKGBUILD versions, sources and checksums from upstream releases",
    version,
    long_about = "Resolves the latest upstream release of each configured package, downloads \
                  every architecture's artifact, and rewrites pkgver, pkgrel, source_<arch> and \
                  sha512sums_<arch> in the package's PKGBUILD. A PKGBUILD is only written when \
                  every artifact was downloaded and hashed."
)]
#[command(group(ArgGroup::new("mode").args(["package", "list", "all"])))]
pub struct Cli {
    /// Package configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE, env = "AUR_UPDATER_CONFIG")]
    config: PathBuf,

    /// Update only this package
    #[arg(short, long, value_name = "NAME")]
    package: Option<String>,

    /// List configured packages and exit
    #[arg(short, long)]
    list: bool,

    /// Update every configured package (default)
    #[arg(short, long)]
    all: bool,

    /// Directory relative `pkgbuild` paths resolve against
    /// [default: the configuration file's directory]
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Directory for downloaded artifacts
    #[arg(long, value_name = "DIR", default_value = DOWNLOAD_DIR)]
    download_dir: PathBuf,

    /// Network timeout in seconds for connecting and for each read
    #[arg(long, value_name = "SECONDS", default_value_t = 10)]
    timeout: u64,

    /// Maximum concurrent artifact downloads per package
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_MAX_PARALLEL_DOWNLOADS)]
    jobs: usize,

    /// Retries for transient network failures
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RETRIES)]
    retries: usize,

    /// Extra request header, e.g. `-H "Referer: https://im.qq.com/"` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Show debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME: VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl Cli {
    /// Run the selected mode with logging configured from the flags.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot be loaded, the requested package is
    /// not configured, or the HTTP client cannot be built. Failed package
    /// updates are reported on the terminal and reflected in the exit code
    /// instead.
    pub async fn execute(self) -> Result<ExitCode> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the verbosity flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            quiet: self.quiet,
        }
    }

    /// Run the selected mode without touching global logging state.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute).
    pub async fn execute_with_config(self, config: CliConfig) -> Result<ExitCode> {
        let packages = PackagesConfig::load_from(&self.config).await?;

        if self.list {
            list::print_packages(&packages, &self.recipe_root());
            return Ok(ExitCode::SUCCESS);
        }

        let updater_config = self.updater_config();
        let fetcher = HttpFetcher::new(updater_config.fetcher_options())
            .context("Failed to set up the HTTP client")?;
        let updater = crate::updater::PackageUpdater::new(updater_config, fetcher);

        let succeeded = match &self.package {
            Some(name) => {
                let package = packages.get(name)?;
                update::run_one(&updater, package, config.quiet).await
            }
            None => update::run_all(&updater, &packages, config.quiet).await,
        };

        Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    fn recipe_root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        match self.config.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        }
    }

    fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig {
            download_dir: self.download_dir.clone(),
            recipe_root: self.recipe_root(),
            timeout: Duration::from_secs(self.timeout),
            max_parallel_downloads: self.jobs,
            retries: self.retries,
            extra_headers: self.headers.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }
}
