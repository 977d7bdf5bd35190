//! Target architectures tracked in PKGBUILD files.
//!
//! The set is closed on purpose: each [`VersionProbe`](crate::parser::VersionProbe)
//! implementation maps every variant to the upstream field that carries its
//! download URL, so adding a variant forces every probe to be revisited.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A CPU/ABI variant with its own artifact, `source_<arch>` and checksum fields.
///
/// The string form is the Arch Linux architecture name used as the field
/// suffix in PKGBUILD files (`source_x86_64`, `sha512sums_aarch64`, ...).
///
/// # Examples
///
/// ```rust
/// use aur_updater::core::Architecture;
///
/// let arch: Architecture = "loong64".parse().unwrap();
/// assert_eq!(arch, Architecture::Loong64);
/// assert_eq!(arch.to_string(), "loong64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Architecture {
    /// 64-bit x86 (`amd64` in Debian naming)
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit ARM (`arm64` in Debian naming)
    #[serde(rename = "aarch64")]
    Aarch64,
    /// 64-bit LoongArch
    #[serde(rename = "loong64")]
    Loong64,
    /// 64-bit little-endian MIPS
    #[serde(rename = "mips64el")]
    Mips64el,
}

impl Architecture {
    /// Every supported architecture, in declaration order.
    pub const ALL: [Architecture; 4] = [
        Architecture::X86_64,
        Architecture::Aarch64,
        Architecture::Loong64,
        Architecture::Mips64el,
    ];

    /// The PKGBUILD name of this architecture.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Aarch64 => "aarch64",
            Architecture::Loong64 => "loong64",
            Architecture::Mips64el => "mips64el",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Architecture {
    type Err = crate::core::UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL.into_iter().find(|arch| arch.as_str() == s).ok_or_else(|| {
            crate::core::UpdaterError::ConfigError {
                message: format!("unknown architecture '{s}'"),
            }
        })
    }
}
