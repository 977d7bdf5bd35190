//! Package descriptors loaded from `packages.yaml`.
//!
//! # File Format
//!
//! ```yaml
//! packages:
//!   linuxqq:
//!     name: linuxqq
//!     source: aur
//!     fetch_url: https://im.qq.com/linuxqq/index.shtml
//!     upstream: https://im.qq.com/linuxqq
//!     parser: QQParser
//!     pkgbuild: linuxqq/PKGBUILD
//!     arch: [x86_64, aarch64, loong64, mips64el]
//! ```
//!
//! `parser` must name a known [`ParserKind`]; the file is rejected otherwise.
//! Architecture names the updater does not track are skipped with a warning so
//! a recipe can list e.g. `i686` without breaking the run. Keys other than the
//! ones above are ignored.

use crate::core::{Architecture, UpdaterError};
use crate::parser::ParserKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Everything the updater needs to know about one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package name, used for artifact file names and log output
    pub name: String,
    /// Where the package is published (informational, e.g. `aur`)
    pub source: Option<String>,
    /// Page or API queried for the latest release
    pub fetch_url: String,
    /// Upstream project page (informational)
    pub upstream: Option<String>,
    /// Parser for the `fetch_url` response
    pub parser: ParserKind,
    /// PKGBUILD location, relative to the recipe root unless absolute
    pub pkgbuild: PathBuf,
    /// Architectures the recipe ships, in configuration order
    pub architectures: Vec<Architecture>,
}

impl PackageDescriptor {
    /// Resolve the PKGBUILD path against `root`.
    #[must_use]
    pub fn recipe_path(&self, root: &Path) -> PathBuf {
        if self.pkgbuild.is_absolute() {
            self.pkgbuild.clone()
        } else {
            root.join(&self.pkgbuild)
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: Option<String>,
    source: Option<String>,
    fetch_url: String,
    upstream: Option<String>,
    parser: ParserKind,
    pkgbuild: PathBuf,
    #[serde(default)]
    arch: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    packages: BTreeMap<String, RawPackage>,
}

/// All configured packages, keyed and iterated by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagesConfig {
    packages: BTreeMap<String, PackageDescriptor>,
}

impl PackagesConfig {
    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid YAML, or names an
    /// unknown parser.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read package config from {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse package config from {}", path.display()))
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::YamlError`] for malformed YAML, a missing required key,
    /// or an unknown parser name.
    pub fn from_yaml_str(content: &str) -> Result<Self, UpdaterError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        let packages = raw
            .packages
            .into_iter()
            .map(|(key, package)| {
                let descriptor = PackageDescriptor {
                    name: package.name.unwrap_or_else(|| key.clone()),
                    source: package.source,
                    fetch_url: package.fetch_url,
                    upstream: package.upstream,
                    parser: package.parser,
                    pkgbuild: package.pkgbuild,
                    architectures: supported_architectures(&key, &package.arch),
                };
                (key, descriptor)
            })
            .collect();

        Ok(Self { packages })
    }

    /// Look up a package by its configuration key.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::UnknownPackage`] if no such package is configured.
    pub fn get(&self, name: &str) -> Result<&PackageDescriptor, UpdaterError> {
        self.packages.get(name).ok_or_else(|| UpdaterError::UnknownPackage {
            name: name.to_string(),
        })
    }

    /// Package keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Descriptors in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
        self.packages.values()
    }

    /// Number of configured packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no packages are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

fn supported_architectures(package: &str, names: &[String]) -> Vec<Architecture> {
    let mut architectures = Vec::new();
    for name in names {
        match name.parse::<Architecture>() {
            Ok(arch) if !architectures.contains(&arch) => architectures.push(arch),
            Ok(_) => {}
            Err(_) => warn!("Package {}: ignoring unsupported architecture '{}'", package, name),
        }
    }
    if architectures.is_empty() {
        warn!("Package {} declares no supported architectures", package);
    }
    architectures
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r"
packages:
  linuxqq:
    name: linuxqq
    source: aur
    fetch_url: https://im.qq.com/linuxqq/index.shtml
    upstream: https://im.qq.com/linuxqq
    parser: QQParser
    pkgbuild: linuxqq/PKGBUILD
    arch: [x86_64, aarch64, i686, x86_64]
    maintainer: ignored
  another:
    fetch_url: https://example.com
    parser: qq
    pkgbuild: /abs/PKGBUILD
";

    #[test]
    fn test_parse_packages() {
        let config = PackagesConfig::from_yaml_str(CONFIG).unwrap();
        assert_eq!(config.len(), 2);
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["another", "linuxqq"]);

        let qq = config.get("linuxqq").unwrap();
        assert_eq!(qq.parser, ParserKind::Qq);
        assert_eq!(qq.source.as_deref(), Some("aur"));
        assert_eq!(qq.architectures, vec![Architecture::X86_64, Architecture::Aarch64]);

        let another = config.get("another").unwrap();
        assert_eq!(another.name, "another");
        assert!(another.architectures.is_empty());
    }

    #[test]
    fn test_recipe_path_resolution() {
        let config = PackagesConfig::from_yaml_str(CONFIG).unwrap();
        let root = Path::new("/srv/aur");
        assert_eq!(
            config.get("linuxqq").unwrap().recipe_path(root),
            PathBuf::from("/srv/aur/linuxqq/PKGBUILD")
        );
        assert_eq!(
            config.get("another").unwrap().recipe_path(root),
            PathBuf::from("/abs/PKGBUILD")
        );
    }

    #[test]
    fn test_unknown_package() {
        let config = PackagesConfig::from_yaml_str(CONFIG).unwrap();
        assert!(matches!(config.get("wechat"), Err(UpdaterError::UnknownPackage { .. })));
    }

    #[test]
    fn test_unknown_parser_rejected() {
        let yaml = "packages:\n  x:\n    fetch_url: u\n    parser: Nope\n    pkgbuild: p\n";
        assert!(matches!(PackagesConfig::from_yaml_str(yaml), Err(UpdaterError::YamlError(_))));
    }

    #[test]
    fn test_empty_document() {
        let config = PackagesConfig::from_yaml_str("packages: {}\n").unwrap();
        assert!(config.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("packages.yaml");
        tokio::fs::write(&path, CONFIG).await.unwrap();

        let config = PackagesConfig::load_from(&path).await.unwrap();
        assert_eq!(config.len(), 2);

        let missing = PackagesConfig::load_from(&temp.path().join("nope.yaml")).await;
        assert!(missing.unwrap_err().to_string().contains("Failed to read package config"));
    }
}
