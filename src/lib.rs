//! aur-updater - keep AUR PKGBUILDs in sync with upstream releases
//!
//! For binary-repack packages (a vendor ships `.deb` files, the AUR package
//! repackages them) every upstream release means the same manual chore: find
//! the new version, download each architecture's artifact, hash it, and edit
//! `pkgver`, `pkgrel`, `source_<arch>` and `sha512sums_<arch>` in the
//! PKGBUILD. This crate automates that chore.
//!
//! # Architecture Overview
//!
//! Data flows strictly downward through four stages:
//!
//! 1. A [`parser::VersionProbe`] turns the upstream page into a version and a
//!    download URL per architecture
//! 2. The [`checksum`] pipeline downloads each artifact and computes its digest
//! 3. A [`recipe::PkgbuildDocument`] rewrites the affected PKGBUILD lines in
//!    memory, leaving every other byte alone
//! 4. The [`updater::PackageUpdater`] sequences the stages and persists the
//!    PKGBUILD only when all of them succeeded
//!
//! # Core Modules
//!
//! ## Pipeline
//! - [`parser`] - upstream response parsers, selected per package by [`parser::ParserKind`]
//! - [`checksum`] - downloads, sha256/sha512 digests and PKGBUILD checksum formatting
//! - [`recipe`] - the line-indexed PKGBUILD model
//! - [`updater`] - the per-package state machine and the batch driver
//!
//! ## Supporting Modules
//! - [`config`] - `packages.yaml` descriptors and runtime settings
//! - [`fetcher`] - the network capability and its `reqwest` implementation
//! - [`core`] - architectures, error types and user-facing error reporting
//! - [`cli`] - command-line interface
//! - [`utils`] - atomic file writes and directory helpers
//!
//! # Configuration Format (packages.yaml)
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
//!     arch: [x86_64, aarch64, loong64]
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Update every configured package
//! aur-updater
//!
//! # Update one package with debug logging
//! aur-updater --package linuxqq --verbose
//!
//! # Show what is configured
//! aur-updater --list
//! ```

pub mod checksum;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fetcher;
pub mod parser;
pub mod recipe;
pub mod updater;
pub mod utils;

// Test utilities (only available in test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
