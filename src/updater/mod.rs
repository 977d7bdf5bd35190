//! Package update orchestration
//!
//! [`PackageUpdater`] runs one package through a fixed sequence of steps and
//! stops at the first failure:
//!
//! ```text
//! FETCH → PARSE_VERSION → COMPARE ─(same version)→ up to date
//!                            │
//!                            └→ RESOLVE_ARCH_URLS → DOWNLOAD_AND_HASH → PATCH_DOCUMENT → PERSIST
//! ```
//!
//! # All-or-nothing
//!
//! The PKGBUILD is edited in memory and written once, at the very end. Every
//! architecture's artifact is downloaded and hashed before the first field is
//! touched, and one failed download fails the whole package: a recipe with
//! some architectures on the new version and others on the old one would not
//! build.
//!
//! An architecture the upstream page does not offer is skipped and its fields
//! are left alone. Only when no declared architecture has a URL does the
//! update fail.
//!
//! # Batches
//!
//! [`PackageUpdater::update_all`] runs every configured package in turn.
//! Failures are collected in the [`BatchReport`] and never stop the batch.


use crate::checksum::{ChecksumRecord, HashAlgorithm, artifact_file_name, download_and_hash};
use crate::config::{PackageDescriptor, PackagesConfig, UpdaterConfig};
use crate::core::{Architecture, UpdaterError};
use crate::fetcher::Fetcher;
use crate::recipe::{PkgbuildDocument, RecipeUpdate};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// The step at which a package update failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The upstream page could not be fetched
    Fetch,
    /// No version could be extracted from the upstream page
    ParseVersion,
    /// The PKGBUILD could not be loaded
    Recipe,
    /// None of the declared architectures has a download URL
    NoUrls,
    /// Downloading or hashing this architecture's artifact failed
    Download(Architecture),
    /// Writing the PKGBUILD failed
    Persist,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Fetch => f.write_str("fetch"),
            FailureStage::ParseVersion => f.write_str("parse-version"),
            FailureStage::Recipe => f.write_str("recipe"),
            FailureStage::NoUrls => f.write_str("no-urls"),
            FailureStage::Download(arch) => write!(f, "download:{arch}"),
            FailureStage::Persist => f.write_str("persist"),
        }
    }
}

/// A failed package update. The recipe on disk is unchanged.
#[derive(Debug, thiserror::Error)]
#[error("{package}: {stage} failed: {cause}")]
pub struct UpdateFailure {
    /// Package name
    pub package: String,
    /// Step that failed
    pub stage: FailureStage,
    /// Underlying error
    #[source]
    pub cause: UpdaterError,
}

/// A successful package update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The recipe already has the upstream version; nothing was written
    UpToDate {
        /// Package name
        package: String,
        /// The current (and upstream) version
        version: String,
    },
    /// The recipe was rewritten for a new version
    Updated {
        /// Package name
        package: String,
        /// `pkgver` before the update, if the recipe had one
        previous: Option<String>,
        /// The new `pkgver`
        version: String,
        /// Architectures whose source and checksum were updated
        architectures: Vec<Architecture>,
        /// Declared architectures upstream had no artifact for
        skipped: Vec<Architecture>,
    },
}

impl UpdateOutcome {
    /// Package name.
    #[must_use]
    pub fn package(&self) -> &str {
        match self {
            UpdateOutcome::UpToDate { package, .. } | UpdateOutcome::Updated { package, .. } => {
                package
            }
        }
    }
}

/// Results of [`PackageUpdater::update_all`], in package order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per package
    pub results: Vec<Result<UpdateOutcome, UpdateFailure>>,
}

impl BatchReport {
    /// Number of packages processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Number of packages that are now up to date.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    /// The failed packages.
    pub fn failures(&self) -> impl Iterator<Item = &UpdateFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    /// Whether every package succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }

    /// `N/M packages updated successfully`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}/{} packages updated successfully", self.succeeded(), self.total())
    }
}

/// Runs the update sequence for configured packages.
///
/// # Examples
///
/// ```rust,no_run
/// use aur_updater::config::{PackagesConfig, UpdaterConfig};
/// use aur_updater::fetcher::HttpFetcher;
/// use aur_updater::updater::PackageUpdater;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let packages = PackagesConfig::load_from(Path::new("packages.yaml")).await?;
/// let config = UpdaterConfig::default();
/// let fetcher = HttpFetcher::new(config.fetcher_options())?;
///
/// let report = PackageUpdater::new(config, fetcher).update_all(&packages).await;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PackageUpdater<F: Fetcher> {
    config: UpdaterConfig,
    fetcher: F,
}

impl<F: Fetcher> PackageUpdater<F> {
    /// Create an updater with explicit settings and network capability.
    pub const fn new(config: UpdaterConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// The settings this updater runs with.
    pub const fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Update every package in `packages`, one at a time.
    pub async fn update_all(&self, packages: &PackagesConfig) -> BatchReport {
        let mut report = BatchReport::default();
        for package in packages.iter() {
            let result = self.update_package(package).await;
            if let Err(failure) = &result {
                warn!(package = %failure.package, stage = %failure.stage, "Update failed: {}", failure.cause);
            }
            report.results.push(result);
        }
        info!("{}", report.summary());
        report
    }

    /// Bring one package's PKGBUILD up to date with upstream.
    ///
    /// # Errors
    ///
    /// An [`UpdateFailure`] naming the failed step. The PKGBUILD on disk is
    /// unchanged whenever this returns an error.
    pub async fn update_package(
        &self,
        package: &PackageDescriptor,
    ) -> Result<UpdateOutcome, UpdateFailure> {
        let fail = |stage: FailureStage, cause: UpdaterError| UpdateFailure {
            package: package.name.clone(),
            stage,
            cause,
        };
        let probe = package.parser.probe();
        info!(package = %package.name, parser = %package.parser, "Checking for updates");

        // FETCH
        debug!(package = %package.name, url = %package.fetch_url, "Fetching upstream page");
        let response = self
            .fetcher
            .fetch_text(&package.fetch_url)
            .await
            .map_err(|e| fail(FailureStage::Fetch, e))?;

        // PARSE_VERSION
        let version = probe.parse_version(&response).ok_or_else(|| {
            fail(
                FailureStage::ParseVersion,
                UpdaterError::ParseFailed {
                    what: format!("version from {}", package.fetch_url),
                },
            )
        })?;
        debug!(package = %package.name, version = %version, "Resolved upstream version");

        // COMPARE
        let recipe_path = package.recipe_path(&self.config.recipe_root);
        let mut document =
            PkgbuildDocument::load(&recipe_path).map_err(|e| fail(FailureStage::Recipe, e))?;
        let previous = document.pkgver();
        if previous.as_deref() == Some(version.as_str()) {
            info!(package = %package.name, version = %version, "Already up to date");
            return Ok(UpdateOutcome::UpToDate {
                package: package.name.clone(),
                version,
            });
        }
        info!(
            package = %package.name,
            version = %version,
            "Updating from {}",
            previous.as_deref().unwrap_or("<none>")
        );

        // RESOLVE_ARCH_URLS
        let urls = probe.parse_download_urls(&package.architectures, &response);
        let skipped: Vec<Architecture> = package
            .architectures
            .iter()
            .copied()
            .filter(|arch| !urls.contains_key(arch))
            .collect();
        for arch in &skipped {
            warn!(package = %package.name, arch = %arch, "No download URL upstream, skipping");
        }
        if urls.is_empty() {
            return Err(fail(
                FailureStage::NoUrls,
                UpdaterError::ParseFailed {
                    what: format!("download URLs for any of {:?}", package.architectures),
                },
            ));
        }

        // DOWNLOAD_AND_HASH
        let records = self.download_all(package, &version, &urls).await.map_err(|(arch, e)| {
            fail(FailureStage::Download(arch), e)
        })?;

        // PATCH_DOCUMENT
        let update = RecipeUpdate {
            version: Some(version.clone()),
            pkgrel: Some("1".to_string()),
            sources: urls.clone(),
            checksums: records.into_values().collect(),
            ..RecipeUpdate::default()
        };
        for field in document.apply(&update) {
            warn!(package = %package.name, field = %field, "Field not declared in PKGBUILD, left unset");
        }

        // PERSIST
        document.save().map_err(|e| fail(FailureStage::Persist, e))?;
        info!(package = %package.name, version = %version, path = %recipe_path.display(), "PKGBUILD updated");

        Ok(UpdateOutcome::Updated {
            package: package.name.clone(),
            previous,
            version,
            architectures: urls.into_keys().collect(),
            skipped,
        })
    }

    /// Download and hash every artifact, at most `max_parallel_downloads` at a time.
    ///
    /// Waits for all downloads, then reports the failure of the first
    /// architecture (in enum order) that failed.
    async fn download_all(
        &self,
        package: &PackageDescriptor,
        version: &str,
        urls: &BTreeMap<Architecture, String>,
    ) -> Result<BTreeMap<Architecture, ChecksumRecord>, (Architecture, UpdaterError)> {
        let downloads = stream::iter(urls.iter().map(|(&arch, url)| {
            let dest = self
                .config
                .download_dir
                .join(artifact_file_name(&package.name, version, arch, url));
            async move {
                debug!(package = %package.name, arch = %arch, url = %url, "Downloading artifact");
                let result =
                    download_and_hash(&self.fetcher, arch, url, &dest, HashAlgorithm::Sha512).await;
                (arch, result)
            }
        }))
        .buffer_unordered(self.config.download_concurrency())
        .collect::<Vec<_>>()
        .await;

        let mut records = BTreeMap::new();
        let mut failures = Vec::new();
        for (arch, result) in downloads {
            match result {
                Ok(record) => {
                    debug!(package = %package.name, arch = %arch, "sha512 {}", record.digest);
                    records.insert(arch, record);
                }
                Err(e) => {
                    warn!(package = %package.name, arch = %arch, "Download failed: {}", e);
                    failures.push((arch, e));
                }
            }
        }

        failures.sort_by_key(|(arch, _)| *arch);
        match failures.into_iter().next() {
            Some(failure) => Err(failure),
            None => Ok(records),
        }
    }
}
