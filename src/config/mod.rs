//! Configuration for the updater
//!
//! Two kinds of configuration feed an update run:
//!
//! 1. **Package descriptors** ([`PackagesConfig`]) from `packages.yaml`: which
//!    packages exist, where their upstream lives, which parser reads it, where
//!    the PKGBUILD is, and which architectures it ships
//! 2. **Runtime settings** ([`UpdaterConfig`]) from the command line: download
//!    directory, recipe root, timeouts and parallelism
//!
//! Both are plain values handed to the
//! [`PackageUpdater`](crate::updater::PackageUpdater); nothing is read from
//! global state during an update.

mod packages;
mod settings;

pub use packages::{PackageDescriptor, PackagesConfig};
pub use settings::UpdaterConfig;
