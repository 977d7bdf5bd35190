//! Artifact digests
//!
//! Computes and verifies the checksums written into `sha256sums*` and
//! `sha512sums*` PKGBUILD fields. Files are hashed in fixed-size chunks so
//! large artifacts never have to fit in memory.
//!
//! # Digest Format
//!
//! Digests are lowercase hex, the form `makepkg` writes and expects. Comparison
//! in [`verify_file`] ignores case so checksums copied from upstream release
//! notes in uppercase still verify.
//!
//! # Examples
//!
//! ```rust,no_run
//! use aur_updater::checksum::{HashAlgorithm, hash_file, verify_file};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let path = Path::new("downloads/linuxqq_3.2.1_x86_64.deb");
//! let digest = hash_file(path, HashAlgorithm::Sha512).await?;
//! assert!(verify_file(path, HashAlgorithm::Sha512, &digest.to_uppercase()).await);
//! # Ok(())
//! # }
//! ```

pub mod download;

pub use download::{artifact_file_name, download, download_and_hash, download_and_verify};

use crate::core::{Architecture, UpdaterError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Digest algorithms supported in PKGBUILD checksum arrays.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (`sha256sums`)
    Sha256,
    /// SHA-512 (`sha512sums`), the default for recipes
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha256, HashAlgorithm::Sha512];

    /// Lowercase algorithm name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// The PKGBUILD array holding digests of this kind, e.g. `sha512sums`.
    #[must_use]
    pub fn field_prefix(&self) -> String {
        format!("{}sums", self.as_str())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(UpdaterError::UnsupportedAlgorithm { name: s.to_string() }),
        }
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// A digest computed for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    /// Architecture the artifact belongs to, `None` for the generic field
    pub arch: Option<Architecture>,
    /// Algorithm used
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest
    pub digest: String,
}

impl ChecksumRecord {
    /// The PKGBUILD field this record belongs in, e.g. `sha512sums_x86_64`.
    #[must_use]
    pub fn field_name(&self) -> String {
        checksum_field_name(self.algorithm, self.arch)
    }

    /// The full PKGBUILD line, e.g. `sha512sums_x86_64=('ab12...')`.
    #[must_use]
    pub fn pkgbuild_line(&self) -> String {
        format_checksum(self.algorithm, self.arch, &self.digest)
    }
}

/// Name of the checksum field for `algorithm` and an optional architecture.
#[must_use]
pub fn checksum_field_name(algorithm: HashAlgorithm, arch: Option<Architecture>) -> String {
    match arch {
        Some(arch) => format!("{}_{arch}", algorithm.field_prefix()),
        None => algorithm.field_prefix(),
    }
}

/// Format a digest as a single-element PKGBUILD checksum line.
///
/// ```rust
/// use aur_updater::checksum::{HashAlgorithm, format_checksum};
/// use aur_updater::core::Architecture;
///
/// assert_eq!(
///     format_checksum(HashAlgorithm::Sha512, Some(Architecture::Aarch64), "ab"),
///     "sha512sums_aarch64=('ab')"
/// );
/// assert_eq!(format_checksum(HashAlgorithm::Sha256, None, "cd"), "sha256sums=('cd')");
/// ```
#[must_use]
pub fn format_checksum(algorithm: HashAlgorithm, arch: Option<Architecture>, digest: &str) -> String {
    format!("{}=('{digest}')", checksum_field_name(algorithm, arch))
}

/// Format per-architecture sha512 digests, plus an optional generic one, as
/// field name → `('digest')` pairs.
#[must_use]
pub fn format_checksums(
    by_arch: &BTreeMap<Architecture, String>,
    generic: Option<&str>,
) -> BTreeMap<String, String> {
    let mut formatted: BTreeMap<String, String> = by_arch
        .iter()
        .map(|(&arch, digest)| {
            (checksum_field_name(HashAlgorithm::Sha512, Some(arch)), format!("('{digest}')"))
        })
        .collect();

    if let Some(digest) = generic {
        formatted.insert(HashAlgorithm::Sha512.field_prefix(), format!("('{digest}')"));
    }
    formatted
}

async fn open_existing(path: &Path) -> Result<tokio::fs::File, UpdaterError> {
    match tokio::fs::File::open(path).await {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(UpdaterError::FileNotFound {
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Compute the digests of `path` for several algorithms in a single read.
///
/// # Errors
///
/// [`UpdaterError::FileNotFound`] if `path` does not exist, or an I/O error.
pub async fn hash_many(
    path: &Path,
    algorithms: &[HashAlgorithm],
) -> Result<BTreeMap<HashAlgorithm, String>, UpdaterError> {
    let mut file = open_existing(path).await?;
    let mut hashers: Vec<(HashAlgorithm, Hasher)> =
        algorithms.iter().map(|&algorithm| (algorithm, Hasher::new(algorithm))).collect();

    let mut buffer = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        for (_, hasher) in &mut hashers {
            hasher.update(&buffer[..read]);
        }
    }

    Ok(hashers.into_iter().map(|(algorithm, hasher)| (algorithm, hasher.finalize_hex())).collect())
}

/// Compute the lowercase hex digest of `path`.
///
/// # Errors
///
/// [`UpdaterError::FileNotFound`] if `path` does not exist, or an I/O error.
pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String, UpdaterError> {
    let mut digests = hash_many(path, &[algorithm]).await?;
    digests.remove(&algorithm).ok_or_else(|| UpdaterError::UnsupportedAlgorithm {
        name: algorithm.to_string(),
    })
}

/// Compute the digest of `path` with an algorithm given by name.
///
/// # Errors
///
/// [`UpdaterError::UnsupportedAlgorithm`] for names other than `sha256` and
/// `sha512`, otherwise as [`hash_file`].
pub async fn hash_file_named(path: &Path, algorithm: &str) -> Result<String, UpdaterError> {
    let algorithm: HashAlgorithm = algorithm.parse()?;
    hash_file(path, algorithm).await
}

/// Whether `path` has digest `expected` (case-insensitive).
///
/// Any failure to read the file counts as a mismatch; this never errors.
pub async fn verify_file(path: &Path, algorithm: HashAlgorithm, expected: &str) -> bool {
    match hash_file(path, algorithm).await {
        Ok(actual) => actual.eq_ignore_ascii_case(expected.trim()),
        Err(e) => {
            tracing::debug!("Verification of {} failed: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_SHA512: &str = "9b71d224bd62f3785d96d46ad3ea3d73319bfbc2890caadae2dff72519673ca72323c3d99ba5c11d7c7acc6e14b8c5da0c4663475c2e5c3adef46f73bcdec043";

    async fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_known_digests() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "hello", b"hello").await;

        assert_eq!(hash_file(&path, HashAlgorithm::Sha256).await.unwrap(), HELLO_SHA256);
        assert_eq!(hash_file(&path, HashAlgorithm::Sha512).await.unwrap(), HELLO_SHA512);
    }

    #[tokio::test]
    async fn test_hash_is_stable_and_sensitive() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "artifact", &vec![7u8; READ_CHUNK_SIZE * 3 + 11]).await;

        let first = hash_file(&path, HashAlgorithm::Sha512).await.unwrap();
        let second = hash_file(&path, HashAlgorithm::Sha512).await.unwrap();
        assert_eq!(first, second);

        let mut changed = vec![7u8; READ_CHUNK_SIZE * 3 + 11];
        changed[READ_CHUNK_SIZE + 1] = 8;
        tokio::fs::write(&path, &changed).await.unwrap();
        assert_ne!(hash_file(&path, HashAlgorithm::Sha512).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_hash_many_matches_individual() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "hello", b"hello").await;

        let digests = hash_many(&path, &HashAlgorithm::ALL).await.unwrap();
        assert_eq!(digests[&HashAlgorithm::Sha256], HELLO_SHA256);
        assert_eq!(digests[&HashAlgorithm::Sha512], HELLO_SHA512);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = hash_file(&temp.path().join("nope"), HashAlgorithm::Sha512).await;
        assert!(matches!(result, Err(UpdaterError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_algorithm() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "hello", b"hello").await;

        let result = hash_file_named(&path, "md5").await;
        assert!(matches!(result, Err(UpdaterError::UnsupportedAlgorithm { .. })));
        assert_eq!(hash_file_named(&path, "SHA256").await.unwrap(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn test_verify_is_case_insensitive_and_never_errors() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, "hello", b"hello").await;

        assert!(verify_file(&path, HashAlgorithm::Sha256, &HELLO_SHA256.to_uppercase()).await);
        assert!(!verify_file(&path, HashAlgorithm::Sha256, "deadbeef").await);
        assert!(!verify_file(&temp.path().join("missing"), HashAlgorithm::Sha256, HELLO_SHA256).await);
    }

    #[test]
    fn test_record_formatting() {
        let record = ChecksumRecord {
            arch: Some(Architecture::X86_64),
            algorithm: HashAlgorithm::Sha512,
            digest: "abc".to_string(),
        };
        assert_eq!(record.field_name(), "sha512sums_x86_64");
        assert_eq!(record.pkgbuild_line(), "sha512sums_x86_64=('abc')");
    }

    #[test]
    fn test_format_checksums_with_generic() {
        let mut by_arch = BTreeMap::new();
        by_arch.insert(Architecture::Loong64, "aa".to_string());

        let formatted = format_checksums(&by_arch, Some("bb"));
        assert_eq!(formatted["sha512sums_loong64"], "('aa')");
        assert_eq!(formatted["sha512sums"], "('bb')");
        assert_eq!(formatted.len(), 2);
    }
}
