//! Integration test suite for aur-updater
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: `packages.yaml` + PKGBUILD on disk, driven through the
//!   library with a scripted fetcher
//! - **cli**: the `aur-updater` binary's modes and error reporting (no network)

mod cli;
mod pipeline;
