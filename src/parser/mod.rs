//! Upstream response parsers
//!
//! Every upstream site publishes its releases differently: an HTML page with an
//! embedded object literal, a JSON API, a directory listing. A
//! [`VersionProbe`] owns the knowledge of one such shape and turns the raw
//! response text into a version string and per-architecture download URLs.
//!
//! # Parser Selection
//!
//! Packages name their parser in the configuration file. The name is resolved
//! into a [`ParserKind`] once, when the configuration is deserialized, so the
//! update pipeline dispatches on a closed enum instead of matching strings.
//!
//! # Failure Policy
//!
//! Extraction never fails loudly: anything that cannot be found yields `None`
//! and the caller decides whether that absence is fatal. An architecture that
//! the upstream payload does not mention yields `None` for that architecture
//! only.

pub mod qq;

pub use qq::QqProbe;

use crate::core::Architecture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A resolved upstream release: version plus the URL of each available artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbeResult {
    /// The release version, as it should appear in `pkgver`
    pub version: String,
    /// Download URL per architecture; architectures upstream lacks are absent
    pub urls_by_arch: BTreeMap<Architecture, String>,
}

/// Extracts release information from one upstream response format.
pub trait VersionProbe: Send + Sync {
    /// Extract the release version from `response`.
    fn parse_version(&self, response: &str) -> Option<String>;

    /// Extract the artifact URL for `arch` from `response`.
    fn parse_download_url(&self, arch: Architecture, response: &str) -> Option<String>;

    /// Extract URLs for every architecture in `archs`, skipping those upstream lacks.
    fn parse_download_urls(
        &self,
        archs: &[Architecture],
        response: &str,
    ) -> BTreeMap<Architecture, String> {
        archs
            .iter()
            .filter_map(|&arch| self.parse_download_url(arch, response).map(|url| (arch, url)))
            .collect()
    }

    /// Extract the version and the URLs for `archs` in one pass.
    ///
    /// Returns `None` only when the version itself cannot be found.
    fn probe(&self, archs: &[Architecture], response: &str) -> Option<VersionProbeResult> {
        let version = self.parse_version(response)?;
        Some(VersionProbeResult {
            version,
            urls_by_arch: self.parse_download_urls(archs, response),
        })
    }
}

/// The closed set of upstream parsers, named in the `parser` config field.
///
/// # Examples
///
/// ```rust
/// use aur_updater::parser::ParserKind;
///
/// let kind: ParserKind = serde_yaml::from_str("QQParser").unwrap();
/// assert_eq!(kind, ParserKind::Qq);
/// assert_eq!(kind.to_string(), "QQParser");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParserKind {
    /// Tencent QQ for Linux download page
    #[serde(rename = "QQParser", alias = "qq")]
    Qq,
}

impl ParserKind {
    /// The probe implementation for this kind.
    #[must_use]
    pub fn probe(self) -> &'static dyn VersionProbe {
        match self {
            ParserKind::Qq => &QqProbe,
        }
    }

    /// The name used in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Qq => "QQParser",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
