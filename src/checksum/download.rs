//! Artifact downloads
//!
//! A download streams into a hidden temporary file beside its destination and
//! is renamed into place only once the body is complete and synced. Any failure
//! drops the temporary file, so the destination path never holds a truncated
//! artifact.

use super::{ChecksumRecord, HashAlgorithm, hash_file};
use crate::constants::DEFAULT_ARTIFACT_EXTENSION;
use crate::core::{Architecture, UpdaterError};
use crate::fetcher::Fetcher;
use crate::utils::fs::{ensure_dir, remove_if_exists, sibling_temp_file};
use std::path::Path;
use tracing::{debug, warn};

/// File name for a downloaded artifact: `<package>_<version>_<arch>.<ext>`.
///
/// The extension comes from the last path segment of `url`, ignoring any query
/// string, and falls back to `deb`.
///
/// ```rust
/// use aur_updater::checksum::artifact_file_name;
/// use aur_updater::core::Architecture;
///
/// let name = artifact_file_name("linuxqq", "3.2.1", Architecture::X86_64, "https://x/QQ_3.2.1_amd64.deb?v=1");
/// assert_eq!(name, "linuxqq_3.2.1_x86_64.deb");
/// ```
#[must_use]
pub fn artifact_file_name(package: &str, version: &str, arch: Architecture, url: &str) -> String {
    format!("{package}_{version}_{arch}.{}", url_extension(url))
}

fn url_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => DEFAULT_ARTIFACT_EXTENSION,
    }
}

fn write_error(path: &Path, error: impl std::fmt::Display) -> UpdaterError {
    UpdaterError::PersistFailed {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}

/// Download `url` to `dest`, returning the number of bytes written.
///
/// An existing file at `dest` is removed first. On failure nothing is left at
/// `dest`.
///
/// # Errors
///
/// Network failures from `fetcher`, or [`UpdaterError::PersistFailed`] if the
/// destination directory or file cannot be written.
pub async fn download<F: Fetcher>(fetcher: &F, url: &str, dest: &Path) -> Result<u64, UpdaterError> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent).map_err(|e| write_error(parent, format!("{e:#}")))?;
    remove_if_exists(dest).map_err(|e| write_error(dest, format!("{e:#}")))?;

    let temp = sibling_temp_file(parent, ".download-", ".part", dest)
        .map_err(|e| write_error(parent, e))?;

    let mut file = tokio::fs::File::from_std(temp.as_file().try_clone()?);
    let written = fetcher.download_into(url, &mut file).await?;
    file.sync_all().await?;
    drop(file);

    temp.persist(dest).map_err(|e| write_error(dest, e.error))?;
    debug!("Downloaded {} bytes from {} to {}", written, url, dest.display());
    Ok(written)
}

/// Download the artifact for `arch` and compute its digest.
///
/// # Errors
///
/// As [`download`], plus any failure hashing the finished file.
pub async fn download_and_hash<F: Fetcher>(
    fetcher: &F,
    arch: Architecture,
    url: &str,
    dest: &Path,
    algorithm: HashAlgorithm,
) -> Result<ChecksumRecord, UpdaterError> {
    download(fetcher, url, dest).await?;
    let digest = hash_file(dest, algorithm).await?;
    Ok(ChecksumRecord {
        arch: Some(arch),
        algorithm,
        digest,
    })
}

/// Download `url` to `dest` and check it against `expected`.
///
/// A file whose digest does not match is deleted before returning.
///
/// # Errors
///
/// [`UpdaterError::HashMismatch`] on a digest mismatch, otherwise as [`download`].
pub async fn download_and_verify<F: Fetcher>(
    fetcher: &F,
    url: &str,
    dest: &Path,
    algorithm: HashAlgorithm,
    expected: &str,
) -> Result<(), UpdaterError> {
    download(fetcher, url, dest).await?;

    let actual = match hash_file(dest, algorithm).await {
        Ok(actual) => actual,
        Err(e) => {
            discard(dest);
            return Err(e);
        }
    };

    if actual.eq_ignore_ascii_case(expected.trim()) {
        return Ok(());
    }

    warn!("Checksum mismatch for {}, removing it", dest.display());
    discard(dest);
    Err(UpdaterError::HashMismatch {
        path: dest.display().to_string(),
        expected: expected.to_string(),
        actual,
    })
}

fn discard(path: &Path) {
    if let Err(e) = remove_if_exists(path) {
        warn!("Failed to remove {}: {:#}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockFetcher;
    use tempfile::TempDir;

    const URL: &str = "https://dl.example.com/QQ_3.2.1_amd64.deb";

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_artifact_file_name_extensions() {
        let arch = Architecture::Aarch64;
        assert_eq!(
            artifact_file_name("linuxqq", "1.0", arch, "https://x/a.rpm"),
            "linuxqq_1.0_aarch64.rpm"
        );
        assert_eq!(
            artifact_file_name("linuxqq", "1.0", arch, "https://x/download?id=3"),
            "linuxqq_1.0_aarch64.deb"
        );
        assert_eq!(
            artifact_file_name("linuxqq", "1.0", arch, "https://x/.hidden"),
            "linuxqq_1.0_aarch64.deb"
        );
    }

    #[tokio::test]
    async fn test_download_writes_destination() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("downloads/linuxqq_3.2.1_x86_64.deb");
        let fetcher = MockFetcher::new().with_bytes(URL, b"artifact bytes".to_vec());

        let written = download(&fetcher, URL, &dest).await.unwrap();
        assert_eq!(written, 14);
        assert_eq!(std::fs::read(&dest).unwrap(), b"artifact bytes");
        assert_eq!(dir_entries(dest.parent().unwrap()), vec!["linuxqq_3.2.1_x86_64.deb"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_downloaded_artifact_uses_umask_default() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let reference = temp.path().join("reference");
        std::fs::write(&reference, "x").unwrap();
        let expected = std::fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        let dest = temp.path().join("artifact.deb");
        let fetcher = MockFetcher::new().with_bytes(URL, b"artifact bytes".to_vec());
        download(&fetcher, URL, &dest).await.unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("artifact.deb");
        std::fs::write(&dest, b"stale from a previous run").unwrap();
        let fetcher = MockFetcher::new().with_truncated(URL, b"half an artif".to_vec());

        let result = download(&fetcher, URL, &dest).await;
        assert!(matches!(result, Err(UpdaterError::FetchFailed { .. })));
        assert!(dir_entries(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_http_error_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("artifact.deb");
        let fetcher = MockFetcher::new().with_status(URL, 404);

        let result = download(&fetcher, URL, &dest).await;
        assert!(matches!(result, Err(UpdaterError::HttpStatus { status: 404, .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_and_hash_record() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("artifact.deb");
        let fetcher = MockFetcher::new().with_bytes(URL, b"hello".to_vec());

        let record = download_and_hash(&fetcher, Architecture::X86_64, URL, &dest, HashAlgorithm::Sha256)
            .await
            .unwrap();
        assert_eq!(record.arch, Some(Architecture::X86_64));
        assert_eq!(
            record.digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn test_download_and_verify_removes_mismatch() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("artifact.deb");
        let fetcher = MockFetcher::new().with_bytes(URL, b"hello".to_vec());

        let result = download_and_verify(&fetcher, URL, &dest, HashAlgorithm::Sha256, "00ff").await;
        assert!(matches!(result, Err(UpdaterError::HashMismatch { .. })));
        assert!(!dest.exists());

        download_and_verify(
            &fetcher,
            URL,
            &dest,
            HashAlgorithm::Sha256,
            "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824",
        )
        .await
        .unwrap();
        assert!(dest.exists());
    }
}
